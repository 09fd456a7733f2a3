//! In-memory progress stream

use paged_rpc::paging::ProgressStream;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Writer whose bytes stay readable after it is handed to a progress stream
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream(&self) -> ProgressStream {
        ProgressStream::new(Box::new(self.clone()))
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
