use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nowcast_image::Image;
use nowcast_imgproc::pyramid::{pyrdown, pyrdown_size};

fn bench_pyramid(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pyramid Operations");

    for (width, height) in [(256, 224), (512, 448), (710, 640)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image_data = (0..(*width * *height)).map(|x| x as f32).collect();
        let image = Image::<f32, 1>::new(image_size, image_data).unwrap();

        let down_image = Image::<f32, 1>::from_size_val(pyrdown_size(image_size), 0.0).unwrap();

        group.bench_with_input(
            BenchmarkId::new("pyrdown", &parameter_string),
            &(&image, &down_image),
            |b, i| {
                let (src, mut dst) = (i.0, i.1.clone());
                b.iter(|| {
                    black_box(pyrdown(src, &mut dst)).unwrap();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pyramid);
criterion_main!(benches);
