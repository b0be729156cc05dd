//! Line-oriented terminal prompts for the rating sessions.

use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub struct Prompter<R, W> {
    input: R,
    out: W,
}

impl Prompter<tokio::io::BufReader<tokio::io::Stdin>, std::io::Stderr> {
    /// Reads answers from stdin; questions go to stderr so stdout stays clean.
    pub fn stdio() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()), std::io::stderr())
    }
}

impl<R: AsyncBufRead + Unpin, W: Write> Prompter<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn say(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// Prints `question` and returns the trimmed answer, or `None` at end of input.
    pub async fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        write!(self.out, "{}", question)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks until `parse` accepts the answer. An empty answer yields
    /// `default` when one is given.
    pub async fn ask_until<T: Clone>(
        &mut self,
        question: &str,
        default: Option<T>,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> anyhow::Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(question).await? else {
                return Ok(None);
            };
            if answer.is_empty() {
                if let Some(d) = &default {
                    return Ok(Some(d.clone()));
                }
            }
            match parse(&answer) {
                Ok(v) => return Ok(Some(v)),
                Err(msg) => self.say(&format!("  {}", msg))?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(s: &str) -> Result<u8, String> {
        s.parse().map_err(|_| format!("not a number: {}", s))
    }

    #[tokio::test]
    async fn test_reprompts_until_valid() {
        let mut out = Vec::new();
        let mut p = Prompter::new(&b"x\n7\n"[..], &mut out);
        let v = p.ask_until("n? ", None, number).await.unwrap();
        assert_eq!(v, Some(7));
        drop(p);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("n? ").count(), 2);
        assert!(text.contains("not a number: x"));
    }

    #[tokio::test]
    async fn test_empty_answer_takes_default_and_eof_is_none() {
        let mut p = Prompter::new(&b"\n"[..], Vec::new());
        assert_eq!(p.ask_until("n? ", Some(3), number).await.unwrap(), Some(3));
        assert_eq!(p.ask_until("n? ", Some(3), number).await.unwrap(), None);
    }
}
