use criterion::{black_box, criterion_group, criterion_main, Criterion};
use saslite::{Interpreter, Parser, Scanner};

const PROGRAM: &str = "
data scores;
    input id name $ s1 s2 s3;
    datalines;
1 ann 90 85 77
2 bob 60 72 81
3 cy 88 91 95
4 dee 70 . 66
;
run;

data totals;
    set scores;
    array s{3} s1-s3;
    retain running 0;
    total = 0;
    do i = 1 to dim(s);
        if s{i} ne . then total = total + s{i};
    end;
    running = running + total;
    if total > 240 then grade = 'A';
    else grade = 'B';
    drop i;
run;

proc sort data=totals out=ranked; by descending total; run;
proc means data=ranked n mean max; var total running; run;
";

fn lexer_benchmark(c: &mut Criterion) {
    c.bench_function("tokenize program", |b| {
        b.iter(|| Scanner::new(black_box(PROGRAM)).scan_tokens().unwrap())
    });
}

fn parser_benchmark(c: &mut Criterion) {
    let tokens = Scanner::new(PROGRAM).scan_tokens().unwrap();
    c.bench_function("parse program", |b| {
        b.iter(|| Parser::new(black_box(tokens.clone())).parse())
    });
}

fn execution_benchmark(c: &mut Criterion) {
    c.bench_function("run data and proc steps", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new();
            interpreter.run(black_box(PROGRAM)).unwrap()
        })
    });

    let mut rows = String::new();
    for i in 0..1000 {
        rows.push_str(&format!("{} {}\n", i, (i * 37) % 101));
    }
    let large = format!(
        "data big; input id v; datalines;\n{};\nrun;\n\
         data out; set big; retain acc 0; acc = acc + v; if mod(id, 2) = 0; run;",
        rows
    );
    c.bench_function("data step over 1000 rows", |b| {
        b.iter(|| {
            let mut interpreter = Interpreter::new();
            interpreter.run(black_box(&large)).unwrap()
        })
    });
}

criterion_group!(benches, lexer_benchmark, parser_benchmark, execution_benchmark);
criterion_main!(benches);
