use crate::error::Error;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Trait abstraction for input/output operations to enable testing the
/// interactive prompt helpers without a real terminal.
pub trait InputOutput {
    /// Print text to output
    fn print(&self, text: &str) -> Result<(), Error>;

    /// Print text to output with newline
    fn println(&self, text: &str) -> Result<(), Error>;

    /// Flush output buffer
    fn flush(&self) -> Result<(), Error>;

    /// Read a line of input from user
    fn read_line(&self) -> Result<String, Error>;
}

/// Real implementation of `InputOutput` backed by stdin/stdout.
pub struct RealInputOutput;

impl InputOutput for RealInputOutput {
    fn print(&self, text: &str) -> Result<(), Error> {
        print!("{text}");
        Ok(())
    }

    fn println(&self, text: &str) -> Result<(), Error> {
        println!("{text}");
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        use std::io::Write;
        std::io::stdout().flush().map_err(Error::Io)
    }

    fn read_line(&self) -> Result<String, Error> {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        let mut line = String::new();
        stdin.lock().read_line(&mut line).map_err(Error::Io)?;
        Ok(line)
    }
}

/// Scripted `InputOutput` for tests: feeds a queue of canned `read_line`
/// responses and records everything printed.
#[derive(Default)]
pub struct ScriptedInputOutput {
    responses: RefCell<VecDeque<String>>,
    pub printed: RefCell<Vec<String>>,
}

impl ScriptedInputOutput {
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            printed: RefCell::new(Vec::new()),
        }
    }
}

impl InputOutput for ScriptedInputOutput {
    fn print(&self, text: &str) -> Result<(), Error> {
        self.printed.borrow_mut().push(text.to_string());
        Ok(())
    }

    fn println(&self, text: &str) -> Result<(), Error> {
        self.printed.borrow_mut().push(format!("{text}\n"));
        Ok(())
    }

    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    fn read_line(&self) -> Result<String, Error> {
        self.responses
            .borrow_mut()
            .pop_front()
            .map(|mut s| {
                s.push('\n');
                s
            })
            .ok_or_else(|| Error::io_error("scripted input exhausted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_input_output_reads_in_order() {
        let io = ScriptedInputOutput::new(["yes", "no"]);
        assert_eq!(io.read_line().unwrap(), "yes\n");
        assert_eq!(io.read_line().unwrap(), "no\n");
        assert!(io.read_line().is_err());
    }

    #[test]
    fn test_scripted_input_output_records_prints() {
        let io = ScriptedInputOutput::new(Vec::<String>::new());
        io.print("Hello").unwrap();
        io.println("World").unwrap();
        assert_eq!(io.printed.borrow().as_slice(), &["Hello".to_string(), "World\n".to_string()]);
    }
}
