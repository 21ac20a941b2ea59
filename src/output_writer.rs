use anyhow::anyhow;
use formatx::formatx;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Destination of the per-building result files
pub trait OutputWriter: Debug + Sync + Send {
    /// Arguments:
    /// * `building_key` - name of the building the file belongs to
    /// * `file_extension` - extension of the file, without the dot
    fn writer_for_building(
        &self,
        building_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

/// Writes one file per building into a directory, named by a template taking the building
/// key and the extension, e.g. `"{}_results.{}"`.
#[derive(Debug)]
pub struct FileOutputWriter {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutputWriter {
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }

    fn file_name(&self, building_key: &str, file_extension: &str) -> anyhow::Result<String> {
        formatx!(&self.file_template, building_key, file_extension)
            .map_err(|_| anyhow!("Output file template {:?} is invalid", self.file_template))
    }
}

impl OutputWriter for FileOutputWriter {
    fn writer_for_building(
        &self,
        building_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(BufWriter::new(File::create(
            self.directory_path
                .join(self.file_name(building_key, file_extension)?),
        )?))
    }
}

impl OutputWriter for &FileOutputWriter {
    fn writer_for_building(
        &self,
        building_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        <FileOutputWriter as OutputWriter>::writer_for_building(self, building_key, file_extension)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutputWriter;

impl OutputWriter for SinkOutputWriter {
    fn writer_for_building(
        &self,
        _building_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}
