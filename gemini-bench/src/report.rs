//! 結果・履歴の表示

use app_config::AppSettings;
use chrono::Local;
use comfy_table::{Cell, CellAlignment, Color, Table};
use generation_strategy::{GenerationRequest, GenerationResult, StrategyKind};
use run_history::HistoryBuffer;

/// 実行結果を表示
pub fn print_result(
    request: &GenerationRequest,
    result: &GenerationResult,
    settings: &AppSettings,
) {
    println!("\n--- Result [{}] ---", request.strategy().label());

    if settings.measure_execution_time {
        println!("Elapsed: {:.2} ms", result.elapsed_ms);
    }

    match result.outcome() {
        Ok(text) => {
            println!("\nOutput:");
            println!("{}", text);
        }
        Err(error) => {
            println!("\nError: {}", error);
        }
    }

    println!("\nExecution info:");
    println!("{}", info_table(request, result, settings.measure_execution_time));
}

fn info_table(request: &GenerationRequest, result: &GenerationResult, show_time: bool) -> Table {
    let mut rows = vec![
        ("Strategy", request.strategy().label().to_string()),
        ("Model", request.model().to_string()),
        ("Temperature", format!("{:.2}", request.temperature())),
        ("Top P", format!("{:.2}", request.top_p())),
        ("Top K", request.top_k().to_string()),
        ("Max output tokens", request.max_output_tokens().to_string()),
        ("Input chars", request.prompt().chars().count().to_string()),
        ("Output chars", result.text.chars().count().to_string()),
    ];
    if show_time {
        rows.push(("Elapsed (ms)", format!("{:.2}", result.elapsed_ms)));
    }

    let mut table = Table::new();
    table.set_header(vec!["Item", "Value"]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

/// 両ストラテジーの所要時間を比較
pub fn print_comparison(results: &[(StrategyKind, GenerationResult)]) {
    println!("\n--- Comparison ---");
    let mut table = Table::new();
    table.set_header(vec!["Strategy", "ms", "Status"]);
    for (kind, result) in results {
        let status = match &result.error {
            None => Cell::new("ok").fg(Color::Green),
            Some(e) => Cell::new(format!("failed ({})", e.kind)).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(kind.as_str()),
            Cell::new(format!("{:.2}", result.elapsed_ms)).set_alignment(CellAlignment::Right),
            status,
        ]);
    }
    println!("{}", table);

    let find = |kind: StrategyKind| {
        results
            .iter()
            .find(|(k, r)| *k == kind && r.is_success())
            .map(|(_, r)| r.elapsed_ms)
    };
    if let (Some(library), Some(rest)) = (find(StrategyKind::Library), find(StrategyKind::Rest)) {
        println!("rest - library = {:+.2} ms", rest - library);
    }
}

/// 実行履歴を表示（古い順）
pub fn print_history(history: &HistoryBuffer, show_time: bool) {
    println!("\n=== History ({}/{}) ===", history.len(), history.capacity());
    println!("{}", history_table(history, show_time));

    if show_time {
        for kind in StrategyKind::ALL {
            if let Some(avg) = history.average_elapsed_ms(kind) {
                println!("average {:<7} {:.2} ms", kind.as_str(), avg);
            }
        }
    }
}

fn history_table(history: &HistoryBuffer, show_time: bool) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Timestamp", "Method", "Model", "Input", "Output", "ms"]);

    for record in history.iter() {
        let elapsed = if show_time {
            format!("{:.2}", record.elapsed_ms)
        } else {
            "-".to_string()
        };
        let timestamp = record.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        table.add_row(vec![
            Cell::new(timestamp),
            Cell::new(record.strategy.as_str()),
            Cell::new(&record.model).fg(Color::Cyan),
            Cell::new(record.input_length).set_alignment(CellAlignment::Right),
            Cell::new(record.output_length).set_alignment(CellAlignment::Right),
            Cell::new(elapsed).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
