// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use std::{
    env,
    ffi::OsStr,
    fmt, io,
    io::Write,
    path::Path,
};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};

const DEFAULT_LOG_FILE_STEM: &str = "tipfeed";

/// Size limits for the rotated log files of one directory.
#[derive(Clone, Copy, Debug)]
pub(super) struct Rotation {
    /// A file is rotated once it grows past this many bytes.
    pub(super) max_bytes: usize,
    /// Rotated files beyond this count are compressed.
    pub(super) uncompressed_files: usize,
    /// Oldest files beyond this count are deleted.
    pub(super) max_files: usize,
}

/// A non-blocking writer to `{dir}/{binary name}.log`, rotated by size.
pub(super) fn file_rotater(dir: &Path, rotation: Rotation) -> (NonBlocking, WorkerGuard) {
    let file_appender = RotatingFile::new(dir, log_file_name(), rotation);

    // exert backpressure rather than drop lines
    NonBlockingBuilder::default()
        .lossy(false)
        .finish(file_appender)
}

fn log_file_name() -> String {
    let stem = env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .map(OsStr::to_string_lossy)
                .map(|stem| stem.into_owned())
        })
        .unwrap_or_else(|| DEFAULT_LOG_FILE_STEM.to_string());
    format!("{stem}.log")
}

/// Appends to the most recent log file; older files get a timestamp suffix on rotation.
pub(super) struct RotatingFile {
    writer: FileRotate<AppendTimestamp>,
}

impl RotatingFile {
    pub(super) fn new(directory: impl AsRef<Path>, file_name: String, rotation: Rotation) -> Self {
        let path = directory.as_ref().join(file_name);
        let writer = FileRotate::new(
            path,
            AppendTimestamp::default(FileLimit::MaxFiles(rotation.max_files)),
            ContentLimit::BytesSurpassed(rotation.max_bytes),
            Compression::OnRotate(rotation.uncompressed_files),
            #[cfg(unix)]
            None,
        );
        Self { writer }
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotatingFile").finish()
    }
}
