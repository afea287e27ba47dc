//! Human-readable bundle reports

use colored::{ColoredString, Colorize};

use crate::bundler::{BundleResult, Chunk, ChunkKind};
use crate::graph::DependencyGraph;

/// Print every chunk with its reason and members, then unreachable modules
pub fn print_bundle(graph: &DependencyGraph, result: &BundleResult) {
    if result.chunks.is_empty() && graph.entry().is_none() {
        println!(
            "{} No entry module, nothing to bundle. Mark one module with {}.",
            "!".yellow().bold(),
            "entry = true".cyan()
        );
    }

    for chunk in &result.chunks {
        print_chunk(graph, chunk);
    }

    if !result.unreachable_modules.is_empty() {
        println!(
            "{} {}",
            "Unreachable".red().bold(),
            format!("{} module(s)", result.unreachable_modules.len()).dimmed()
        );
        for id in &result.unreachable_modules {
            print_module(graph, id);
        }
        println!();
    }
}

fn print_chunk(graph: &DependencyGraph, chunk: &Chunk) {
    println!(
        "{} {} {} {}",
        swatch(&chunk.color),
        format!("Chunk {}", chunk.id).bold(),
        kind_label(chunk.kind),
        format!("{} module(s)", chunk.len()).dimmed()
    );
    println!("  {}", chunk.reason.dimmed());

    for id in &chunk.modules {
        print_module(graph, id);
    }
    println!();
}

fn print_module(graph: &DependencyGraph, id: &str) {
    let name = graph.module(id).map(|m| m.name.as_str()).unwrap_or(id);
    println!("    {} {} {}", "•".dimmed(), name, format!("[{}]", id).dimmed());
}

fn kind_label(kind: ChunkKind) -> ColoredString {
    let label = format!("({})", kind);
    match kind {
        ChunkKind::Main => label.blue(),
        ChunkKind::Async => label.green(),
        ChunkKind::Shared => label.magenta(),
    }
}

/// A dot in the chunk's own color
fn swatch(color: &str) -> ColoredString {
    match parse_hex_color(color) {
        Some((r, g, b)) => "●".truecolor(r, g, b),
        None => "●".normal(),
    }
}

/// Parse `#rrggbb`
fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }

    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#3b82f6"), Some((0x3b, 0x82, 0xf6)));
        assert_eq!(parse_hex_color("3b82f6"), None);
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }
}
