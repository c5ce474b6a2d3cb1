use mydrive_crypto::{open, seal, KeyMaterial};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn bench_seal(bencher: divan::Bencher, size: usize) {
    let material = KeyMaterial::generate();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            seal(
                divan::black_box(&material.key),
                divan::black_box(&material.nonce),
                divan::black_box(&data),
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn bench_open(bencher: divan::Bencher, size: usize) {
    let material = KeyMaterial::generate();
    let data = make_data(size);
    let sealed = seal(&material.key, &material.nonce, &data).unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            open(
                divan::black_box(&material.key),
                divan::black_box(&material.nonce),
                divan::black_box(&sealed),
            )
            .unwrap()
        });
}

#[divan::bench]
fn bench_generate_material() -> KeyMaterial {
    KeyMaterial::generate()
}

fn main() {
    divan::main();
}
