//! Parent-chain walk and block rendering
//!
//! One block is rendered per commit, newest first:
//!
//! ```text
//! commit <identifier>
//! Subject: <subject>
//! Date: <weekday month day HH:MM:SS year offset>
//! Metadata: <printed metadata mapping>
//!
//!     <body line>
//!
//!     <body line>
//! ```
//!
//! Each failure kind aborts the whole walk; blocks already written stay
//! written. A visited set bounds the walk so a corrupt store with a circular
//! parent chain fails instead of looping forever.

use crate::artifacts::log::sink::HistorySink;
use crate::artifacts::objects::DecodeError;
use crate::artifacts::objects::commit::CommitRecord;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::collections::HashSet;
use std::io;
use thiserror::Error;

/// Indent prefixed to every rendered body line
const BODY_INDENT: &str = "    ";

/// Read access to the commit store, as the walker sees it
pub trait HistoryStore {
    /// The current head commit, or None if the repository has no commits yet
    fn resolve_head(&self) -> anyhow::Result<Option<ObjectId>>;

    /// Raw record payload for one commit identifier.
    ///
    /// Fails if the identifier cannot be resolved or the stored object is
    /// not a commit.
    fn fetch(&self, id: &ObjectId) -> anyhow::Result<Bytes>;
}

/// Failure of a history render; each kind aborts the walk with no retry
#[derive(Debug, Error)]
pub enum HistoryError {
    /// HEAD resolution itself failed (I/O, corrupt ref)
    #[error("failed to resolve HEAD: {cause}")]
    Head { cause: anyhow::Error },

    /// The repository has no commits yet
    #[error("no HEAD commit exists")]
    NoHead,

    /// The store could not produce bytes for an identifier on the chain
    #[error("failed to fetch commit {id}: {cause}")]
    Fetch { id: String, cause: anyhow::Error },

    /// The fetched bytes did not match the record encoding
    #[error("malformed commit record {id}")]
    Decode {
        id: String,
        #[source]
        source: DecodeError,
    },

    /// The sink rejected a write
    #[error("failed to write rendered block for commit {id}")]
    Write {
        id: String,
        #[source]
        source: io::Error,
    },

    /// The sink failed to close after a successful walk
    #[error("failed to close output sink")]
    Close {
        #[source]
        source: io::Error,
    },

    /// The parent chain revisited an identifier; the store is corrupt
    #[error("parent chain revisits commit {id}")]
    Cycle { id: String },
}

/// Render the whole commit history, newest first, into `sink`.
///
/// Resolves the head commit, then walks parent links until the root
/// commit's empty parent field terminates the chain. Output is streamed
/// block by block; anything written before a failure is left in the sink.
/// The sink is closed exactly once whether the walk succeeds or fails.
pub fn render_history(
    store: &dyn HistoryStore,
    sink: &mut dyn HistorySink,
) -> Result<(), HistoryError> {
    let outcome = walk(store, sink);
    let closed = sink.close();

    match (outcome, closed) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(walk_error), _) => Err(walk_error),
        (Ok(()), Err(source)) => Err(HistoryError::Close { source }),
    }
}

fn walk(store: &dyn HistoryStore, sink: &mut dyn HistorySink) -> Result<(), HistoryError> {
    let head = store
        .resolve_head()
        .map_err(|cause| HistoryError::Head { cause })?
        .ok_or(HistoryError::NoHead)?;

    let mut visited = HashSet::new();
    let mut cursor = head;

    loop {
        if !visited.insert(cursor.clone()) {
            return Err(HistoryError::Cycle {
                id: cursor.to_string(),
            });
        }

        let raw = store.fetch(&cursor).map_err(|cause| HistoryError::Fetch {
            id: cursor.to_string(),
            cause,
        })?;
        let record = CommitRecord::decode(&raw).map_err(|source| HistoryError::Decode {
            id: cursor.to_string(),
            source,
        })?;

        write_block(sink, &cursor, &record).map_err(|source| HistoryError::Write {
            id: cursor.to_string(),
            source,
        })?;

        if record.is_root() {
            return Ok(());
        }

        // an unparseable parent is as unresolvable as a missing one
        cursor = ObjectId::try_parse(record.parent_id().to_string()).map_err(|cause| {
            HistoryError::Fetch {
                id: record.parent_id().to_string(),
                cause,
            }
        })?;
    }
}

/// Write one commit block: header, then each body line as an indented
/// paragraph. The identifier printed is the cursor value, not a record field.
fn write_block(
    sink: &mut dyn HistorySink,
    id: &ObjectId,
    record: &CommitRecord,
) -> io::Result<()> {
    let header = format!(
        "commit {}\nSubject: {}\nDate: {}\nMetadata: {}\n\n",
        id,
        record.subject(),
        record.readable_timestamp(),
        record.metadata()
    );
    sink.write(header.as_bytes())?;

    for line in record.body().lines() {
        sink.write(BODY_INDENT.as_bytes())?;
        sink.write(line.as_bytes())?;
        sink.write(b"\n\n")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::commit::FORMAT_VERSION;
    use crate::artifacts::objects::metadata::{MetaValue, Metadata};
    use byteorder::{BigEndian, WriteBytesExt};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn oid(n: u8) -> ObjectId {
        ObjectId::try_parse(format!("{n:040x}")).unwrap()
    }

    /// Encode a record payload directly, letting tests wire up arbitrary
    /// parent links (including cycles a real store could never hash).
    fn encode_record(parent: &str, subject: &str, body: &str, timestamp: u64) -> Bytes {
        encode_record_with_metadata(parent, subject, body, timestamp, Metadata::new())
    }

    fn encode_record_with_metadata(
        parent: &str,
        subject: &str,
        body: &str,
        timestamp: u64,
        metadata: Metadata,
    ) -> Bytes {
        let mut payload = Vec::new();
        payload.write_u32::<BigEndian>(FORMAT_VERSION).unwrap();
        metadata.write_to(&mut payload).unwrap();
        for field in [parent, subject, body] {
            payload.write_u32::<BigEndian>(field.len() as u32).unwrap();
            payload.extend_from_slice(field.as_bytes());
        }
        payload.write_u64::<BigEndian>(timestamp).unwrap();
        for field in [oid(200).as_ref(), oid(201).as_ref()] {
            payload.write_u32::<BigEndian>(field.len() as u32).unwrap();
            payload.extend_from_slice(field.as_bytes());
        }
        Bytes::from(payload)
    }

    #[derive(Default)]
    struct MemoryStore {
        head: Option<ObjectId>,
        objects: HashMap<ObjectId, Bytes>,
        fetches: RefCell<usize>,
    }

    impl MemoryStore {
        fn fetch_count(&self) -> usize {
            *self.fetches.borrow()
        }
    }

    impl HistoryStore for MemoryStore {
        fn resolve_head(&self) -> anyhow::Result<Option<ObjectId>> {
            Ok(self.head.clone())
        }

        fn fetch(&self, id: &ObjectId) -> anyhow::Result<Bytes> {
            *self.fetches.borrow_mut() += 1;
            self.objects
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("object {id} not found"))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        written: Vec<u8>,
        closes: usize,
        fail_writes: bool,
        fail_close: bool,
    }

    impl RecordingSink {
        fn output(&self) -> String {
            String::from_utf8(self.written.clone()).unwrap()
        }
    }

    impl HistorySink for RecordingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<()> {
            if self.fail_writes {
                return Err(io::Error::other("sink rejected write"));
            }
            self.written.extend_from_slice(buf);
            Ok(())
        }

        fn close(&mut self) -> io::Result<()> {
            self.closes += 1;
            if self.fail_close {
                return Err(io::Error::other("sink rejected close"));
            }
            Ok(())
        }
    }

    /// Linear history of `n` commits; returns the store with head at the
    /// newest commit. Commit `i` (1-based from the root) gets subject
    /// "Commit i".
    fn linear_history(n: u8) -> MemoryStore {
        let mut store = MemoryStore::default();
        for i in 1..=n {
            let parent = if i == 1 {
                String::new()
            } else {
                oid(i - 1).to_string()
            };
            let record = encode_record(
                &parent,
                &format!("Commit {i}"),
                &format!("body of commit {i}"),
                1_000_000 + u64::from(i),
            );
            store.objects.insert(oid(i), record);
        }
        store.head = Some(oid(n));
        store
    }

    fn commit_ids(output: &str) -> Vec<String> {
        output
            .lines()
            .filter_map(|line| line.strip_prefix("commit "))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn renders_every_commit_newest_first() {
        let store = linear_history(3);
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        assert_eq!(
            commit_ids(&sink.output()),
            vec![oid(3).to_string(), oid(2).to_string(), oid(1).to_string()]
        );
        assert_eq!(store.fetch_count(), 3);
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn root_head_renders_one_block_without_second_fetch() {
        let store = linear_history(1);
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        assert_eq!(commit_ids(&sink.output()), vec![oid(1).to_string()]);
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn block_format_matches_the_rendered_layout() {
        let mut store = MemoryStore::default();
        let mut metadata = Metadata::new();
        metadata.insert("builder", MetaValue::Text("smithy".to_string()));
        store.objects.insert(
            oid(1),
            encode_record_with_metadata("", "Initial import", "", 0, metadata),
        );
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        assert_eq!(
            sink.output(),
            format!(
                "commit {}\nSubject: Initial import\nDate: Thu Jan 01 00:00:00 1970 +0000\nMetadata: {{'builder': 'smithy'}}\n\n",
                oid(1)
            )
        );
    }

    #[test]
    fn multi_line_body_renders_each_line_once() {
        let mut store = MemoryStore::default();
        store
            .objects
            .insert(oid(1), encode_record("", "Subject", "line one\nline two", 0));
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        let output = sink.output();
        let body_at = output.find("\n\n").unwrap() + 2;
        assert_eq!(&output[body_at..], "    line one\n\n    line two\n\n");
    }

    #[test]
    fn empty_body_renders_no_paragraph() {
        let mut store = MemoryStore::default();
        store
            .objects
            .insert(oid(1), encode_record("", "Subject", "", 0));
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        assert!(sink.output().ends_with("Metadata: {}\n\n"));
    }

    #[test]
    fn empty_metadata_renders_as_empty_mapping() {
        let store = linear_history(1);
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        assert!(sink.output().contains("Metadata: {}\n"));
    }

    #[test]
    fn absent_head_fails_without_fetch_or_write() {
        let store = MemoryStore::default();
        let mut sink = RecordingSink::default();

        let err = render_history(&store, &mut sink).unwrap_err();

        assert!(matches!(err, HistoryError::NoHead));
        assert_eq!(store.fetch_count(), 0);
        assert!(sink.written.is_empty());
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn missing_parent_surfaces_fetch_error_with_prior_blocks_written() {
        let mut store = linear_history(3);
        store.objects.remove(&oid(1));
        let mut sink = RecordingSink::default();

        let err = render_history(&store, &mut sink).unwrap_err();

        match err {
            HistoryError::Fetch { id, .. } => assert_eq!(id, oid(1).to_string()),
            other => panic!("expected Fetch, got {other:?}"),
        }
        // the two commits before the failure were already streamed out
        assert_eq!(
            commit_ids(&sink.output()),
            vec![oid(3).to_string(), oid(2).to_string()]
        );
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn malformed_record_stops_further_fetches() {
        let mut store = linear_history(3);
        store
            .objects
            .insert(oid(2), Bytes::from_static(b"not a record"));
        let mut sink = RecordingSink::default();

        let err = render_history(&store, &mut sink).unwrap_err();

        match err {
            HistoryError::Decode { id, .. } => assert_eq!(id, oid(2).to_string()),
            other => panic!("expected Decode, got {other:?}"),
        }
        // the failing fetch is the last one
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(commit_ids(&sink.output()), vec![oid(3).to_string()]);
    }

    #[test]
    fn self_referential_parent_is_reported_as_cycle() {
        let mut store = MemoryStore::default();
        store.objects.insert(
            oid(1),
            encode_record(oid(1).as_ref(), "I am my own parent", "", 0),
        );
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        let err = render_history(&store, &mut sink).unwrap_err();

        match err {
            HistoryError::Cycle { id } => assert_eq!(id, oid(1).to_string()),
            other => panic!("expected Cycle, got {other:?}"),
        }
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn longer_cycle_is_detected_at_first_revisit() {
        let mut store = MemoryStore::default();
        store
            .objects
            .insert(oid(1), encode_record(oid(2).as_ref(), "one", "", 0));
        store
            .objects
            .insert(oid(2), encode_record(oid(1).as_ref(), "two", "", 0));
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        let err = render_history(&store, &mut sink).unwrap_err();

        match err {
            HistoryError::Cycle { id } => assert_eq!(id, oid(1).to_string()),
            other => panic!("expected Cycle, got {other:?}"),
        }
        // both commits rendered before the revisit was noticed
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn write_failure_aborts_and_still_closes_once() {
        let store = linear_history(2);
        let mut sink = RecordingSink {
            fail_writes: true,
            ..Default::default()
        };

        let err = render_history(&store, &mut sink).unwrap_err();

        assert!(matches!(err, HistoryError::Write { .. }));
        assert_eq!(store.fetch_count(), 1);
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn close_failure_after_successful_walk_is_reported() {
        let store = linear_history(1);
        let mut sink = RecordingSink {
            fail_close: true,
            ..Default::default()
        };

        let err = render_history(&store, &mut sink).unwrap_err();

        assert!(matches!(err, HistoryError::Close { .. }));
    }

    #[test]
    fn walk_failure_takes_precedence_over_close_failure() {
        let store = MemoryStore::default();
        let mut sink = RecordingSink {
            fail_close: true,
            ..Default::default()
        };

        let err = render_history(&store, &mut sink).unwrap_err();

        assert!(matches!(err, HistoryError::NoHead));
        assert_eq!(sink.closes, 1);
    }

    #[test]
    fn unparseable_parent_id_is_an_unresolvable_fetch() {
        let mut store = MemoryStore::default();
        store
            .objects
            .insert(oid(1), encode_record("not-a-hex-id", "Subject", "", 0));
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        let err = render_history(&store, &mut sink).unwrap_err();

        match err {
            HistoryError::Fetch { id, .. } => assert_eq!(id, "not-a-hex-id"),
            other => panic!("expected Fetch, got {other:?}"),
        }
        // the head block itself was already rendered
        assert_eq!(commit_ids(&sink.output()), vec![oid(1).to_string()]);
    }

    /// Serialized records produced by the real encoder walk identically;
    /// guards against the hand-rolled test encoder drifting from the codec.
    #[test]
    fn real_encoder_output_walks_too() {
        let root = CommitRecord::new(
            Metadata::new(),
            None,
            "Initial",
            "first body",
            1_000,
            &oid(200),
            &oid(201),
        );
        let mut store = MemoryStore::default();
        store.objects.insert(oid(1), root.encode().unwrap());
        store.head = Some(oid(1));
        let mut sink = RecordingSink::default();

        render_history(&store, &mut sink).unwrap();

        assert!(sink.output().contains("Subject: Initial"));
        assert!(sink.output().contains("    first body\n\n"));
    }
}
