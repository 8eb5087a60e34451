//! Output serialization collaborator.

use crate::emit::OutputRecord;
use crate::error::Result;

/// Persists output records, one message per record, in the order received.
///
/// Nothing written before `finish` may be visible as complete output. When
/// the run fails, `abort` is called instead and must discard partial output.
pub trait RecordSink {
    fn write(&mut self, record: &OutputRecord) -> Result<()>;

    fn finish(&mut self) -> Result<()>;

    fn abort(&mut self);
}
