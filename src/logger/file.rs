/// File persistence for log lines
///
/// Lines are appended to `<log_dir>/notification-hub.log` through a buffered
/// writer. File logging is off until `init_file_logging` succeeds.
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

const LOG_FILE_NAME: &str = "notification-hub.log";

static LOG_WRITER: Lazy<Mutex<Option<BufWriter<File>>>> = Lazy::new(|| Mutex::new(None));

pub fn init_file_logging(log_dir: &str) {
    let dir = Path::new(log_dir);
    if let Err(e) = fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory '{}': {}", log_dir, e);
        return;
    }

    match OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
    {
        Ok(file) => {
            *LOG_WRITER.lock() = Some(BufWriter::new(file));
        }
        Err(e) => eprintln!("Failed to open log file in '{}': {}", log_dir, e),
    }
}

pub fn write_to_file(line: &str) {
    let mut guard = LOG_WRITER.lock();
    if let Some(writer) = guard.as_mut() {
        // Broken log file must not take the process down
        if writeln!(writer, "{}", line).is_err() {
            *guard = None;
        }
    }
}

pub fn flush_file_logging() {
    if let Some(writer) = LOG_WRITER.lock().as_mut() {
        let _ = writer.flush();
    }
}
