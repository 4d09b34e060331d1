//! `refanno tokenize`: print the token spans of a piece of text.

use crate::output::{OutputMode, pretty_section, render_mode};
use clap::Args;
use refanno_core::tokenizer::{TokenSpan, span_tokenize};
use std::io::Write;

#[derive(Args, Debug)]
pub struct TokenizeArgs {
    /// Text to tokenize. Multiple words are joined with single spaces.
    #[arg(required = true)]
    pub text: Vec<String>,
}

/// Execute `refanno tokenize <text>`.
///
/// # Errors
///
/// Returns an error if output rendering fails.
pub fn run_tokenize(args: &TokenizeArgs, output: OutputMode) -> anyhow::Result<()> {
    let text = args.text.join(" ");
    let spans = span_tokenize(&text);
    render_mode(output, &spans, |spans, w| render_text(spans, w), |spans, w| {
        render_pretty(spans, w)
    })
}

fn render_text(spans: &[TokenSpan], w: &mut dyn Write) -> std::io::Result<()> {
    for span in spans {
        writeln!(w, "{}\t{}\t{}", span.start, span.end, span.text)?;
    }
    Ok(())
}

fn render_pretty(spans: &[TokenSpan], w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("{} tokens", spans.len()))?;
    for span in spans {
        writeln!(w, "{:>5}..{:<5} {}", span.start, span.end, span.text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rows_are_tab_separated() {
        let mut buf = Vec::new();
        render_text(&span_tokenize("one, two"), &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text, "0\t3\tone\n3\t4\t,\n5\t8\ttwo\n");
    }
}
