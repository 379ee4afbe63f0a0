use std::cell::RefCell;

/// Side channel for human-readable progress lines.
pub trait Io {
    fn notice(&self, message: &str);
    fn write_error(&self, message: &str);
}

/// Writes notices to stdout and errors to stderr.
#[derive(Debug, Default)]
pub struct ConsoleIo;

impl Io for ConsoleIo {
    fn notice(&self, message: &str) {
        println!("{message}");
    }

    fn write_error(&self, message: &str) {
        eprintln!("{message}");
    }
}

#[derive(Debug, Default)]
pub struct NullIo;

impl Io for NullIo {
    fn notice(&self, _message: &str) {}

    fn write_error(&self, _message: &str) {}
}

/// Keeps every line in memory; errors are prefixed with `error: `.
#[derive(Debug, Default)]
pub struct BufferedIo {
    lines: RefCell<Vec<String>>,
}

impl BufferedIo {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl Io for BufferedIo {
    fn notice(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }

    fn write_error(&self, message: &str) {
        self.lines.borrow_mut().push(format!("error: {message}"));
    }
}
