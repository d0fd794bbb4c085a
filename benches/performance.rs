use outliner_tui::{
    editor::{Command, Editor},
    render::render_outline,
    theme::Theme,
};
use std::time::{Duration, Instant};

/// Performance benchmarks for outline operations
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Outline rendering
/// - Structural commands on large outlines
/// - Typing and caret movement
/// - Script evaluation
const SMALL_OUTLINE_LEVELS: usize = 10;
const MEDIUM_OUTLINE_LEVELS: usize = 100;
const LARGE_OUTLINE_LEVELS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: &[&str] = &[
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
];

fn sample_line(seed: usize, words: usize) -> String {
    (0..words)
        .map(|idx| SAMPLE_WORDS[(seed + idx) % SAMPLE_WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Top-level siblings, each with a few lines and every third one holding a
/// nested level.
fn create_test_outline(levels: usize) -> Editor {
    let mut editor = Editor::new();
    for idx in 0..levels {
        if idx > 0 {
            editor.run(Command::SplitHorizontal);
        }
        editor.insert_text(&format!("{}\n{}", sample_line(idx, 8), sample_line(idx + 3, 12)));
        if idx % 3 == 0 {
            editor.run(Command::Indent);
            editor.insert_text(&sample_line(idx + 5, 6));
            editor.run(Command::Outdent);
            editor.insert_text(&sample_line(idx + 7, 4));
        }
    }
    editor
}

/// A single level with `rows` rows of three columns each.
fn create_column_outline(rows: usize) -> Editor {
    let mut editor = Editor::new();
    editor.insert_text("header");
    editor.run(Command::SplitVertical);
    editor.run(Command::SplitVertical);
    for idx in 0..rows {
        editor.insert_text(&sample_line(idx, 10));
        editor.run(Command::SplitHorizontal);
    }
    editor
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..3 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn outlines() -> Vec<(&'static str, Editor)> {
    vec![
        ("Small (10 levels)", create_test_outline(SMALL_OUTLINE_LEVELS)),
        ("Medium (100 levels)", create_test_outline(MEDIUM_OUTLINE_LEVELS)),
        ("Large (1000 levels)", create_test_outline(LARGE_OUTLINE_LEVELS)),
    ]
}

#[test]
fn bench_rendering_performance() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    for (name, editor) in outlines() {
        let iterations = if name.starts_with("Large") { 10 } else { ITERATIONS };
        let result = benchmark(&format!("render_outline - {name}"), iterations, || {
            let _ = render_outline(editor.levels(), editor.caret(), 80, &theme);
        });
        result.print();
    }
}

#[test]
fn bench_rendering_columns() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║              COLUMN RENDERING BENCHMARKS                       ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let theme = Theme::default();
    let editor = create_column_outline(200);
    for width in [40, 80, 160] {
        let result = benchmark(&format!("render_outline - 200 rows @ {width}"), ITERATIONS, || {
            let _ = render_outline(editor.levels(), editor.caret(), width, &theme);
        });
        result.print();
    }
}

#[test]
fn bench_indent_outdent_cycle() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║            STRUCTURAL COMMAND BENCHMARKS                       ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, mut editor) in outlines() {
        let result = benchmark(&format!("indent + outdent - {name}"), ITERATIONS, || {
            editor.run(Command::Indent);
            editor.run(Command::Outdent);
        });
        result.print();
    }
}

#[test]
fn bench_split_and_move() {
    let mut editor = create_test_outline(MEDIUM_OUTLINE_LEVELS);
    let result = benchmark("split-horizontal + move-up", ITERATIONS, || {
        editor.run(Command::SplitHorizontal);
        editor.run(Command::MoveUp);
    });
    result.print();
    editor.check_invariants().unwrap();
}

#[test]
fn bench_editing_insert_text() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                TYPING BENCHMARKS                               ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (name, mut editor) in outlines() {
        let result = benchmark(&format!("insert_char - {name}"), ITERATIONS, || {
            editor.insert_char('x');
        });
        result.print();
    }
}

#[test]
fn bench_caret_movement() {
    for (name, mut editor) in outlines() {
        let iterations = if name.starts_with("Large") { 10 } else { ITERATIONS };
        let result = benchmark(&format!("move_up + move_down - {name}"), iterations, || {
            editor.move_up();
            editor.move_down();
        });
        result.print();
    }
}

#[test]
fn bench_script_evaluation() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║               SCRIPT EVALUATION BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let mut editor = Editor::new();
    let result = benchmark("evaluate-as-script-inline", 20, || {
        editor.insert_text("write([1, 2, 3].map(n => n * 2).join(','))");
        editor.run(Command::EvalScriptInline);
        editor.insert_line_break();
    });
    result.print();
}

#[cfg(test)]
mod summary {
    #[test]
    fn print_summary() {
        println!("\n\n╔════════════════════════════════════════════════════════════════╗");
        println!("║                    BENCHMARK SUMMARY                           ║");
        println!("╚════════════════════════════════════════════════════════════════╝");
        println!("\nTo run all benchmarks:");
        println!("  cargo test --release --bench performance -- --nocapture --test-threads=1");
        println!("\nKey metrics to watch:");
        println!("  • Rendering time for large outlines (runs on every frame)");
        println!("  • Structural commands (should be < 10ms per keypress)");
        println!("  • Script evaluation (a fresh sandbox per run)");
    }
}
