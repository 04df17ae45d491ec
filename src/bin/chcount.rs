//! Counts occurrences of one character in a UTF-8 text file.
//!
//! Prints the count followed by a newline. The file is split into chunks on
//! character boundaries and the chunks are counted on scoped threads.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::{CommandFactory, Parser};

/// Below this size the file is counted on the calling thread.
const PARALLEL_THRESHOLD: usize = 64 * 1024;

#[derive(Debug, Parser)]
#[command(name = "chcount")]
#[command(about = "Count occurrences of a character in a file", long_about = None)]
struct Cli {
    /// Character to count
    #[arg(short = 'c', long)]
    character: char,

    /// Input file
    #[arg(short = 'f', long = "input-file")]
    input_file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.input_file.is_file() {
        eprintln!("chcount: {}: not a regular file", cli.input_file.display());
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    }

    let bytes = match std::fs::read(&cli.input_file) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("chcount: {}: {e}", cli.input_file.display());
            return ExitCode::FAILURE;
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    let workers = thread::available_parallelism().map_or(1, |n| n.get());
    println!("{}", count(&text, cli.character, workers));
    ExitCode::SUCCESS
}

fn count(text: &str, needle: char, workers: usize) -> usize {
    if workers <= 1 || text.len() < PARALLEL_THRESHOLD {
        return count_chunk(text, needle);
    }

    let chunks = split_on_char_boundaries(text, workers);
    thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| scope.spawn(move || count_chunk(chunk, needle)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .sum()
    })
}

fn count_chunk(text: &str, needle: char) -> usize {
    text.chars().filter(|&c| c == needle).count()
}

/// Split `text` into at most `parts` non-empty slices without cutting a character.
fn split_on_char_boundaries(text: &str, parts: usize) -> Vec<&str> {
    let target = text.len().div_ceil(parts.max(1));
    let mut chunks = Vec::with_capacity(parts);
    let mut rest = text;

    while !rest.is_empty() {
        let mut end = target.min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_ascii_and_multibyte() {
        assert_eq!(count_chunk("banana", 'a'), 3);
        assert_eq!(count_chunk("ééaé", 'é'), 3);
        assert_eq!(count_chunk("", 'a'), 0);
    }

    #[test]
    fn chunks_never_split_characters() {
        let text = "é".repeat(1001);
        let chunks = split_on_char_boundaries(&text, 7);
        assert!(chunks.len() <= 7);
        assert_eq!(chunks.concat(), text);
        assert_eq!(chunks.iter().map(|c| count_chunk(c, 'é')).sum::<usize>(), 1001);
    }

    #[test]
    fn parallel_count_matches_sequential() {
        let text = "abcé\n".repeat(PARALLEL_THRESHOLD);
        assert_eq!(count(&text, 'é', 4), PARALLEL_THRESHOLD);
        assert_eq!(count(&text, 'a', 1), PARALLEL_THRESHOLD);
    }
}
