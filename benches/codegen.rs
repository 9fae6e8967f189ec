use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vfcodegen::{FnSpec, MatlabGenerator};

fn bench_generate_spec(c: &mut Criterion) {
    let spec = FnSpec::from_str(
        r#"{
            "name": "hh",
            "pars": ["gna", "gk", "gl", "vna", "vk", "vl", "C", "Iapp"],
            "vars": ["v", "m", "h", "n"],
            "equations": {
                "v": "(Iapp - gna*m^3*h*(v-vna) - gk*n^4*(v-vk) - gl*(v-vl))/C",
                "m": "(ma(v)*(1-m) - mb(v)*m)",
                "h": "(ha(v)*(1-h) - hb(v)*h)",
                "n": "(na(v)*(1-n) - nb(v)*n)"
            },
            "auxfns": {
                "ma": { "args": ["u"], "body": "0.32*(u+54)/(1-exp(-(u+54)/4))" },
                "mb": { "args": ["u"], "body": "0.28*(u+27)/(exp((u+27)/5)-1)" },
                "ha": { "args": ["u"], "body": "0.128*exp(-(50+u)/18)" },
                "hb": { "args": ["u"], "body": "4/(1+exp(-(u+27)/5))" },
                "na": { "args": ["u"], "body": "0.032*(u+52)/(1-exp(-(u+52)/5))" },
                "nb": { "args": ["u"], "body": "0.5*exp(-(57+u)/40)" }
            },
            "reuseterms": { "v-vna": "w0", "v-vk": "w1" }
        }"#,
    )
    .unwrap();
    spec.validate().unwrap();
    let names = spec.vars.clone();
    let exprs = spec.equations.clone();

    c.bench_function("generate_spec/hodgkin_huxley", |b| {
        b.iter(|| {
            let mut generator = MatlabGenerator::with_defaults(spec.clone());
            black_box(generator.generate_spec(&names, &exprs).unwrap())
        })
    });
}

criterion_group!(benches, bench_generate_spec);
criterion_main!(benches);
