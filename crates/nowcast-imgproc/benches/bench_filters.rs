use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use nowcast_image::Image;
use nowcast_imgproc::filter::{gaussian_filter, spatial_gradient};

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("Filters");

    for (width, height) in [(256, 224), (512, 448), (710, 640)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        let image_size = [*width, *height].into();
        let image_data = (0..(*width * *height)).map(|x| (x % 255) as f32).collect();
        let image = Image::<f32, 1>::new(image_size, image_data).unwrap();
        let output = Image::<f32, 1>::from_size_val(image_size, 0.0).unwrap();

        for sigma in [1.0f32, 3.0] {
            group.bench_with_input(
                BenchmarkId::new(format!("gaussian_filter_sigma{sigma}"), &parameter_string),
                &(&image, &output),
                |b, i| {
                    let (src, mut dst) = (i.0, i.1.clone());
                    b.iter(|| {
                        black_box(gaussian_filter(src, &mut dst, sigma)).unwrap();
                    })
                },
            );
        }

        group.bench_with_input(
            BenchmarkId::new("spatial_gradient", &parameter_string),
            &(&image, &output),
            |b, i| {
                let (src, mut dx) = (i.0, i.1.clone());
                let mut dy = i.1.clone();
                b.iter(|| {
                    black_box(spatial_gradient(src, &mut dx, &mut dy)).unwrap();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_filters);
criterion_main!(benches);
