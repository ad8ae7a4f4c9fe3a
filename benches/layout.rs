use criterion::{
    black_box, criterion_group, criterion_main, AxisScale, BenchmarkId, Criterion,
    PlotConfiguration, Throughput,
};
use nclayout::{
    layout::{Layout, RegularLayout, TiledLayout},
    section::Section,
};

fn regular_layout_strided(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("regular_layout_strided");
    group.plot_config(plot_config);

    for size in [16u64, 64, 256] {
        let shape = vec![size; 3];
        let wanted = Section::new_with_origin_shape_stride(&[0; 3], &[size / 2; 3], &[2; 3])
            .unwrap();
        group.throughput(Throughput::Elements(wanted.compute_size()));
        group.bench_function(BenchmarkId::new("size", size), |b| {
            b.iter(|| {
                let layout = RegularLayout::new(0, 4, None, &shape, &wanted).unwrap();
                layout.for_each(|chunk| {
                    black_box(chunk.file_pos());
                });
            });
        });
        group.bench_function(BenchmarkId::new("elements", size), |b| {
            b.iter(|| {
                let indices = wanted.linearised_indices(&shape).unwrap();
                indices.iter().for_each(|index| {
                    black_box(index * 4);
                });
            });
        });
    }
}

fn regular_layout_merged(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("regular_layout_merged");
    group.plot_config(plot_config);

    for size in [16u64, 64, 256] {
        let shape = vec![size; 3];
        let wanted =
            Section::new_with_origin_shape(&[1, 0, 0], &[size - 1, size / 2, size]).unwrap();
        group.throughput(Throughput::Elements(wanted.compute_size()));
        group.bench_function(BenchmarkId::new("size", size), |b| {
            b.iter(|| {
                let layout = RegularLayout::new(0, 4, None, &shape, &wanted).unwrap();
                black_box(layout.chunk_size_hint());
                layout.for_each(|chunk| {
                    black_box(chunk.file_pos());
                });
            });
        });
    }
}

fn tiled_layout(c: &mut Criterion) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group("tiled_layout");
    group.plot_config(plot_config);

    for size in [16u64, 64, 256] {
        let data = Section::new_with_origin_shape(&[size / 4; 3], &[size; 3]).unwrap();
        let want = Section::new_with_origin_shape(&[0; 3], &[size; 3]).unwrap();
        group.throughput(Throughput::Elements(
            data.intersect(&want).unwrap().unwrap().compute_size(),
        ));
        group.bench_function(BenchmarkId::new("size", size), |b| {
            b.iter(|| {
                let layout = TiledLayout::new(4, &data, &want).unwrap();
                layout.for_each(|chunk| {
                    black_box(chunk.start_elem());
                });
            });
        });
    }
}

criterion_group!(benches, regular_layout_strided, regular_layout_merged, tiled_layout);
criterion_main!(benches);
