//! Best-effort snapshot and restore of a queue's current contents.
//!
//! A snapshot is not a write-ahead log: it captures whatever the queue
//! holds at the moment both locks are taken, in FIFO order, and gives
//! no durability guarantee beyond "the bytes reached the OS". See
//! `SPEC_FULL.md` §4/§6/§9 for the format decision and rationale.
//!
//! # On-disk format
//!
//! ```text
//! magic:   4 bytes, b"BQS1"
//! version: 4 bytes, little-endian u32, currently 1
//! record*: 4 bytes little-endian payload length
//!          <payload length> bytes of bincode-encoded item
//!          4 bytes little-endian CRC32 of the payload
//! ```
//!
//! Records run until EOF; there is no trailing count or footer, so a
//! reader just keeps pulling records until a read comes back short.

use crate::error::PersistError;
use crate::queue::Queue;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const MAGIC: &[u8; 4] = b"BQS1";
const FORMAT_VERSION: u32 = 1;

fn seconds_since_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs()
}

fn write_record<W: Write>(out: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len()).expect("item encodes to under 4 GiB");
    out.write_all(&len.to_le_bytes())?;
    out.write_all(payload)?;
    let checksum = crc32fast::hash(payload);
    out.write_all(&checksum.to_le_bytes())
}

/// Reads one record, or `None` at a clean EOF (no bytes read for the
/// length prefix). Any other short read is a genuine I/O error.
fn read_record<R: Read>(input: &mut R) -> Result<Option<Vec<u8>>, PersistError> {
    let mut len_buf = [0u8; 4];
    match input.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_buf) as usize;

    let mut payload = vec![0u8; len];
    input.read_exact(&mut payload)?;

    let mut checksum_buf = [0u8; 4];
    input.read_exact(&mut checksum_buf)?;
    let expected = u32::from_le_bytes(checksum_buf);
    let actual = crc32fast::hash(&payload);
    if actual != expected {
        return Err(PersistError::ChecksumMismatch);
    }

    Ok(Some(payload))
}

impl<T: Serialize> Queue<T> {
    /// Snapshots the queue's current contents (in FIFO order) to a new
    /// file named `<prefix><seconds-since-epoch>.txt`, returning the
    /// path written.
    ///
    /// Takes `head` and then `tail` for the duration of the write, so a
    /// concurrent push or pop is blocked until the snapshot completes;
    /// this mirrors the original's `std::lock(m_headMutex, m_tailMutex)`
    /// simultaneous acquisition rather than reducing it to a shorter
    /// critical section, since a snapshot that let the queue mutate
    /// mid-write would no longer represent any single point in time.
    pub fn store_to_disk(&self, prefix: &str) -> Result<PathBuf, PersistError> {
        let mut filename = String::from(prefix);
        filename.push_str(&seconds_since_epoch().to_string());
        filename.push_str(".txt");
        let path = PathBuf::from(filename);

        let file = File::create(&path)?;
        let mut out = BufWriter::new(file);
        out.write_all(MAGIC)?;
        out.write_all(&FORMAT_VERSION.to_le_bytes())?;

        let head = self.head.lock().unwrap();
        let tail = self.tail.lock().unwrap();

        let mut cursor: *const crate::node::Node<T> = head.as_ref();
        while !std::ptr::eq(cursor, tail.sentinel.cast_const()) {
            // SAFETY: every node strictly between `head` and `tail.sentinel`
            // is alive and owned by the chain we're holding `head_mutex`
            // for; we stop before ever dereferencing the sentinel itself.
            let node = unsafe { &*cursor };
            let item = node
                .item
                .as_ref()
                .expect("every node before the sentinel carries an item");
            let payload = bincode::serialize(item).map_err(PersistError::Encode)?;
            write_record(&mut out, &payload)?;
            cursor = match &node.next {
                Some(next) => next.as_ref(),
                None => break,
            };
        }

        out.flush()?;
        drop(tail);
        drop(head);
        Ok(path)
    }
}

impl<T: DeserializeOwned> Queue<T> {
    /// Restores items from a snapshot written by
    /// [`store_to_disk`](Queue::store_to_disk), pushing each with
    /// [`try_push`](Queue::try_push).
    ///
    /// Stops and returns `Ok(false)` at the first item that does not
    /// fit (mirrors the original's `tryReadFromDisk` bailing out on the
    /// first rejected `tryPush`), leaving the remainder of the file
    /// unread. Returns `Ok(true)` if every record in the file was
    /// pushed.
    pub fn try_read_from_disk(&self, path: impl AsRef<Path>) -> Result<bool, PersistError> {
        let mut input = open_snapshot(path)?;
        while let Some(payload) = read_record(&mut input)? {
            let item = bincode::deserialize(&payload).map_err(PersistError::Decode)?;
            if !self.try_push(item) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Restores items from a snapshot, blocking on
    /// [`wait_push`](Queue::wait_push) for each one instead of rejecting
    /// when the queue is full.
    ///
    /// Unlike [`try_read_from_disk`](Queue::try_read_from_disk), this
    /// cannot fail partway through on a full queue -- it just waits for
    /// room -- so it either consumes the whole file or returns an error
    /// from the file/framing itself.
    pub fn wait_read_from_disk(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let mut input = open_snapshot(path)?;
        while let Some(payload) = read_record(&mut input)? {
            let item = bincode::deserialize(&payload).map_err(PersistError::Decode)?;
            self.wait_push(item);
        }
        Ok(())
    }
}

fn open_snapshot(path: impl AsRef<Path>) -> Result<BufReader<File>, PersistError> {
    let file = File::open(path)?;
    let mut input = BufReader::new(file);

    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(PersistError::BadMagic);
    }

    let mut version_buf = [0u8; 4];
    input.read_exact(&mut version_buf)?;
    let version = u32::from_le_bytes(version_buf);
    if version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(version));
    }

    Ok(input)
}
