use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use testmachine_core::{
    Check, Executor, Generator, OperationCatalog, ProgramSynthesizer, SearchConfig, Synthesis,
    Transform, TypeTag, Value,
};

fn float_catalog() -> OperationCatalog {
    let floats = TypeTag::float("floats");
    let mut catalog = OperationCatalog::new();
    catalog
        .register(Generator::new("generate_floats", floats.clone(), |rng| {
            Value::Float(rng.gen::<f64>())
        }))
        .unwrap();
    catalog
        .register(Transform::compute(
            "add",
            vec![floats.clone(), floats.clone()],
            vec![floats.clone()],
            |args| {
                let a = args[0].as_float().unwrap_or(0.0);
                let b = args[1].as_float().unwrap_or(0.0);
                Ok(vec![Value::Float(a + b)])
            },
        ))
        .unwrap();
    catalog
        .register(Transform::rearrange("swap", vec![floats.clone(), floats.clone()], vec![1, 0]))
        .unwrap();
    catalog
        .register(Check::new("finite", vec![floats], |args| {
            Ok(args[0].as_float().is_some_and(f64::is_finite))
        }))
        .unwrap();
    catalog
}

fn bench_synthesis(c: &mut Criterion) {
    let catalog = float_catalog();
    let config = SearchConfig::default().with_max_steps(200);
    let synthesizer = ProgramSynthesizer::new(&catalog, &config);
    let mut rng = StdRng::seed_from_u64(0);

    c.bench_function("synthesize_200_steps", |b| {
        b.iter(|| black_box(synthesizer.synthesize(&mut rng)))
    });
}

fn bench_execution(c: &mut Criterion) {
    let catalog = float_catalog();
    let config = SearchConfig::default().with_max_steps(200);
    let synthesizer = ProgramSynthesizer::new(&catalog, &config);
    let mut rng = StdRng::seed_from_u64(1);
    let program = match synthesizer.synthesize(&mut rng) {
        Synthesis::Program(program) => program,
        other => panic!("unexpected synthesis: {:?}", other),
    };
    let executor = Executor::new(&catalog);

    c.bench_function("execute_200_steps", |b| {
        b.iter(|| black_box(executor.execute(&program)))
    });
}

criterion_group!(benches, bench_synthesis, bench_execution);
criterion_main!(benches);
