use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::analyzer::{eligible_content, LeafCallback};
use super::node::{FileNode, NodeData};
use crate::error::Result;

const INSTRUCTIONS: &str = "\
# Manually Analyze Code

- Review the file metadata and content below
- Enter your analysis on multiple lines
- To finish, press Ctrl+D (Unix) or Ctrl+Z (Windows)
- Your input will be displayed for confirmation";

/// Human-operated realization of the leaf analysis contract.
///
/// Displays the node's metadata and content, collects a free-form multi-line
/// analysis terminated by end-of-input, and requires explicit confirmation.
/// Rejected or empty input re-prompts with the same context; the operator can
/// never silently proceed with an unconfirmed answer. If the input stream
/// closes mid-session the analyzer fails rather than re-prompting forever.
pub struct ManualAnalyzer<R, W> {
    session: Mutex<ManualSession<R, W>>,
}

impl ManualAnalyzer<BufReader<Stdin>, Stdout> {
    pub fn from_terminal() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> ManualAnalyzer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            session: Mutex::new(ManualSession { input, output }),
        }
    }
}

#[async_trait]
impl<R, W> LeafCallback for ManualAnalyzer<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    async fn analyze(&self, node: &FileNode) -> Result<NodeData> {
        let content = match eligible_content(&node.info)? {
            Some(content) => content,
            None => return Ok(NodeData::default()),
        };
        let metadata = node.info.to_yaml()?;

        let mut session = self.session.lock().await;
        let analysis = session.collect_analysis(node.name(), &metadata, &content)?;

        Ok(NodeData {
            analysis: Some(analysis),
            accumulation_level: None,
        })
    }
}

/// One interactive entry session over a pair of IO handles
struct ManualSession<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ManualSession<R, W> {
    /// Prompt until a non-empty analysis has been entered and confirmed.
    ///
    /// An explicit loop, with the full context redisplayed on every pass, so
    /// repeated rejection cannot grow the call stack. A closed input stream
    /// (end-of-input with no line at all, or during confirmation) ends the
    /// session with an error instead of re-prompting.
    fn collect_analysis(&mut self, name: &str, metadata: &str, content: &str) -> Result<String> {
        loop {
            self.display_context(name, metadata, content)?;

            let analysis = match self.read_multiline()? {
                Some(analysis) => analysis,
                None => return Err(input_closed("before an analysis was entered")),
            };
            if analysis.is_empty() {
                writeln!(self.output, "No analysis provided. Please try again.")?;
                continue;
            }

            writeln!(self.output, "\nYour analysis:")?;
            writeln!(self.output, "{}", analysis)?;
            write!(self.output, "Is this analysis correct? [y/n] ")?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                return Err(input_closed("before the analysis was confirmed"));
            }
            if answer.trim().eq_ignore_ascii_case("y") {
                return Ok(analysis);
            }
        }
    }

    fn display_context(&mut self, name: &str, metadata: &str, content: &str) -> Result<()> {
        writeln!(self.output, "{}", INSTRUCTIONS)?;
        writeln!(self.output, "\n--- File metadata: {} ---", name)?;
        writeln!(self.output, "{}", metadata)?;
        writeln!(self.output, "\n--- File content ---")?;
        writeln!(self.output, "{}", content)?;
        writeln!(self.output, "\nEnter your analysis:")?;
        self.output.flush()?;
        Ok(())
    }

    /// Read lines until end-of-input, returning the trimmed joined text.
    ///
    /// `None` means the stream was already at end-of-input before a single
    /// line arrived: the input is gone, not merely this entry ended.
    fn read_multiline(&mut self) -> Result<Option<String>> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            lines.push(line.trim_end_matches(['\n', '\r']).to_string());
        }
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(lines.join("\n").trim().to_string()))
    }
}

fn input_closed(when: &str) -> crate::error::ArbordocError {
    std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        format!("input closed {when}"),
    )
    .into()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Read};

    use super::super::node::testing::*;
    use super::*;

    /// Input source scripted as text chunks and explicit end-of-input marks
    /// (`None`), the way a terminal serves bytes and Ctrl+D presses
    struct ScriptedInput {
        items: VecDeque<Option<Vec<u8>>>,
        pos: usize,
    }

    impl ScriptedInput {
        fn new(items: &[Option<&str>]) -> Self {
            Self {
                items: items
                    .iter()
                    .map(|item| item.map(|text| text.as_bytes().to_vec()))
                    .collect(),
                pos: 0,
            }
        }
    }

    impl Read for ScriptedInput {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let available = self.fill_buf()?;
            let n = available.len().min(buf.len());
            buf[..n].copy_from_slice(&available[..n]);
            self.consume(n);
            Ok(n)
        }
    }

    impl BufRead for ScriptedInput {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            loop {
                match self.items.front() {
                    None => return Ok(&[]),
                    Some(None) => {
                        // one EOF per mark, then reading continues
                        self.items.pop_front();
                        self.pos = 0;
                        return Ok(&[]);
                    }
                    Some(Some(bytes)) if self.pos >= bytes.len() => {
                        self.items.pop_front();
                        self.pos = 0;
                    }
                    Some(Some(_)) => break,
                }
            }
            match self.items.front() {
                Some(Some(bytes)) => Ok(&bytes[self.pos..]),
                _ => unreachable!("loop breaks only on a non-empty chunk"),
            }
        }

        fn consume(&mut self, amt: usize) {
            self.pos += amt;
        }
    }

    fn session(items: &[Option<&str>]) -> ManualSession<ScriptedInput, Vec<u8>> {
        ManualSession {
            input: ScriptedInput::new(items),
            output: Vec::new(),
        }
    }

    #[test]
    fn test_confirmed_entry_is_accepted() {
        let mut session = session(&[Some("line one\nline two\n"), None, Some("y\n")]);
        let analysis = session
            .collect_analysis("a.py", "file_name: a.py", "print(1)")
            .unwrap();
        assert_eq!(analysis, "line one\nline two");
    }

    #[test]
    fn test_rejected_entry_reprompts() {
        let mut session = session(&[
            Some("first try\n"),
            None,
            Some("n\n"),
            Some("second try\n"),
            None,
            Some("y\n"),
        ]);
        let analysis = session
            .collect_analysis("a.py", "file_name: a.py", "print(1)")
            .unwrap();
        assert_eq!(analysis, "second try");

        let shown = String::from_utf8(session.output.clone()).unwrap();
        let prompts = shown.matches("Enter your analysis:").count();
        assert_eq!(prompts, 2, "context is redisplayed on rejection");
    }

    #[test]
    fn test_empty_entry_reprompts() {
        let mut session = session(&[
            Some("\n"),
            None,
            Some("real answer\n"),
            None,
            Some("y\n"),
        ]);
        let analysis = session
            .collect_analysis("a.py", "file_name: a.py", "print(1)")
            .unwrap();
        assert_eq!(analysis, "real answer");

        let shown = String::from_utf8(session.output.clone()).unwrap();
        assert!(shown.contains("No analysis provided"));
    }

    #[test]
    fn test_closed_input_fails_instead_of_reprompting() {
        // a stream that is already at end-of-input and stays there
        let mut session = session(&[]);
        let result = session.collect_analysis("a.py", "file_name: a.py", "print(1)");
        assert!(result.is_err());

        let shown = String::from_utf8(session.output.clone()).unwrap();
        let prompts = shown.matches("Enter your analysis:").count();
        assert_eq!(prompts, 1, "no re-prompt once the input is gone");
    }

    #[test]
    fn test_input_closing_before_confirmation_fails() {
        let mut session = session(&[Some("my analysis\n"), None]);
        let result = session.collect_analysis("a.py", "file_name: a.py", "print(1)");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ineligible_node_skips_interaction() {
        let analyzer = ManualAnalyzer::new(
            ScriptedInput::new(&[Some("should never be read\n"), None, Some("y\n")]),
            Vec::new(),
        );
        let node = {
            let mut node = leaf("blob.bin");
            node.info.is_text_file = false;
            node
        };

        let result = analyzer.analyze(&node).await.unwrap();
        assert!(result.is_empty());
    }
}
