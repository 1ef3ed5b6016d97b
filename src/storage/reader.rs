// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::errors::StorageError;
use crate::observability::messages::storage::ScanningUnindexedTable;
use crate::observability::messages::StructuredLog;
use crate::storage::format::{data_path, decode_rows, Header, TrackPoint, HEADER_LEN, ROW_LEN};
use crate::storage::index::{read_frame_index, read_track_index, FrameRun, TrackEntry};
use crate::storage::InterpolatedPoint;

/// Read-only access to the trajectory table at one location.
///
/// Every method on the store opens the table, answers, and closes it again.
/// Use [`open`](Self::open) to keep one [`TrackTable`] session for several
/// queries. Opening never modifies anything on disk, so a store can be used
/// while a run is still writing the table.
#[derive(Debug, Clone)]
pub struct TrackStore {
    path: PathBuf,
}

impl TrackStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn open(&self) -> Result<TrackTable, StorageError> {
        TrackTable::open(&self.path)
    }

    pub fn get_frame(&self, frame: u32) -> Result<Vec<TrackPoint>, StorageError> {
        self.open()?.get_frame(frame)
    }

    pub fn frame(&self, frame: u32) -> Result<Vec<TrackPoint>, StorageError> {
        self.open()?.frame(frame)
    }

    pub fn get_all(&self) -> Result<Vec<TrackPoint>, StorageError> {
        self.open()?.get_all()
    }

    pub fn get_track(&self, track_id: u32) -> Result<Vec<TrackPoint>, StorageError> {
        self.open()?.get_track(track_id)
    }

    pub fn query<F>(&self, predicate: F) -> Result<Vec<TrackPoint>, StorageError>
    where
        F: Fn(&TrackPoint) -> bool,
    {
        self.open()?.query(predicate)
    }

    pub fn max_frame(&self) -> Result<u32, StorageError> {
        self.open()?.max_frame()
    }

    pub fn frame_range(&self) -> Result<RangeInclusive<u32>, StorageError> {
        self.open()?.frame_range()
    }

    pub fn interpolate(&self, frame: f64) -> Result<Vec<InterpolatedPoint>, StorageError> {
        self.open()?.interpolate(frame)
    }

    pub fn row_count(&self) -> Result<u64, StorageError> {
        Ok(self.open()?.row_count())
    }

    pub fn is_indexed(&self) -> Result<bool, StorageError> {
        Ok(self.open()?.is_indexed())
    }
}

/// An open table: a query session over the rows committed when it was opened.
///
/// Without indices the table is possibly incomplete; lookups then scan the
/// committed rows instead of failing.
#[derive(Debug)]
pub struct TrackTable {
    path: PathBuf,
    data: File,
    header: Header,
    frames: Option<Vec<FrameRun>>,
    tracks: Option<Vec<TrackEntry>>,
}

impl TrackTable {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let (data, header) = open_data(path)?;

        let (frames, tracks) = match (read_frame_index(path)?, read_track_index(path)?) {
            (Some(frames), Some(tracks)) => {
                check_index(path, &header, &frames, &tracks)?;
                (Some(frames), Some(tracks))
            }
            _ => {
                ScanningUnindexedTable {
                    path,
                    rows: header.rows,
                }
                .log();
                (None, None)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
            header,
            frames,
            tracks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn row_count(&self) -> u64 {
        self.header.rows
    }

    /// Row count the writer expected when it created the table.
    pub fn expected_rows(&self) -> u64 {
        self.header.expected_rows
    }

    /// Whether the table was finalized (or recovered). Unindexed tables may be incomplete.
    pub fn is_indexed(&self) -> bool {
        self.frames.is_some() && self.tracks.is_some()
    }

    pub fn get_all(&self) -> Result<Vec<TrackPoint>, StorageError> {
        self.read_rows(0, self.header.rows)
    }

    /// Rows of one frame; empty if the frame has no rows.
    pub fn get_frame(&self, frame: u32) -> Result<Vec<TrackPoint>, StorageError> {
        match &self.frames {
            Some(runs) => match runs.binary_search_by_key(&frame, |r| r.frame) {
                Ok(i) => self.read_rows(runs[i].first_row, runs[i].row_count),
                Err(_) => Ok(Vec::new()),
            },
            None => self.query(|row| row.frame == frame),
        }
    }

    /// Rows of one frame; fails with [`StorageError::FrameNotFound`] if the frame has no rows.
    pub fn frame(&self, frame: u32) -> Result<Vec<TrackPoint>, StorageError> {
        let rows = self.get_frame(frame)?;
        if rows.is_empty() {
            return Err(StorageError::FrameNotFound(frame));
        }
        Ok(rows)
    }

    /// Every row of one track, in frame order.
    pub fn get_track(&self, track_id: u32) -> Result<Vec<TrackPoint>, StorageError> {
        let Some(entries) = &self.tracks else {
            return self.query(|row| row.track_id == track_id);
        };

        let start = entries.partition_point(|e| e.track_id < track_id);
        let end = entries.partition_point(|e| e.track_id <= track_id);
        let mut rows = Vec::with_capacity(end - start);
        for (first, count) in row_runs(&entries[start..end]) {
            rows.extend(self.read_rows(first, count)?);
        }
        Ok(rows)
    }

    pub fn query<F>(&self, predicate: F) -> Result<Vec<TrackPoint>, StorageError>
    where
        F: Fn(&TrackPoint) -> bool,
    {
        let mut rows = self.get_all()?;
        rows.retain(|row| predicate(row));
        Ok(rows)
    }

    /// Frame numbers that have at least one row, ascending.
    pub fn frames(&self) -> Result<Vec<u32>, StorageError> {
        if let Some(runs) = &self.frames {
            return Ok(runs.iter().map(|r| r.frame).collect());
        }
        let mut frames: Vec<u32> = self.get_all()?.into_iter().map(|row| row.frame).collect();
        frames.dedup();
        Ok(frames)
    }

    pub fn first_frame(&self) -> Result<u32, StorageError> {
        if let Some(run) = self.frames.as_ref().and_then(|runs| runs.first()) {
            return Ok(run.frame);
        }
        self.edge_row(0)
    }

    pub fn max_frame(&self) -> Result<u32, StorageError> {
        if let Some(run) = self.frames.as_ref().and_then(|runs| runs.last()) {
            return Ok(run.frame);
        }
        self.edge_row(self.header.rows.saturating_sub(1))
    }

    /// Every frame number from the first to the last frame with data.
    ///
    /// Frames are assumed contiguous; gaps are not detected.
    pub fn frame_range(&self) -> Result<RangeInclusive<u32>, StorageError> {
        Ok(self.first_frame()?..=self.max_frame()?)
    }

    fn edge_row(&self, row: u64) -> Result<u32, StorageError> {
        if self.header.rows == 0 {
            return Err(StorageError::EmptyTable(self.path.clone()));
        }
        Ok(self.read_rows(row, 1)?[0].frame)
    }

    fn read_rows(&self, first: u64, count: u64) -> Result<Vec<TrackPoint>, StorageError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let span = first
            .checked_add(count)
            .filter(|&end| end <= self.header.rows)
            .and_then(|_| byte_span(first, count));
        let Some((offset, len)) = span else {
            return Err(StorageError::Corrupt {
                path: self.path.clone(),
                reason: format!("rows {}..{} are out of range", first, first.saturating_add(count)),
            });
        };
        let mut file = &self.data;
        file.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; len];
        file.read_exact(&mut bytes)?;
        Ok(decode_rows(&bytes))
    }
}

/// Header and committed rows of the table at `path`.
pub(crate) fn read_committed(path: &Path) -> Result<(Header, Vec<TrackPoint>), StorageError> {
    let (mut data, header) = open_data(path)?;
    let Some((offset, len)) = byte_span(0, header.rows) else {
        return Err(StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("header claims {} rows", header.rows),
        });
    };
    data.seek(SeekFrom::Start(offset))?;
    let mut bytes = vec![0u8; len];
    data.read_exact(&mut bytes)?;
    Ok((header, decode_rows(&bytes)))
}

/// File offset and byte length of `count` rows starting at row `first`,
/// or `None` if either does not fit.
fn byte_span(first: u64, count: u64) -> Option<(u64, usize)> {
    let offset = first.checked_mul(ROW_LEN)?.checked_add(HEADER_LEN)?;
    let len = count.checked_mul(ROW_LEN)?;
    offset.checked_add(len)?;
    Some((offset, usize::try_from(len).ok()?))
}

/// Collapse sorted track entries into `(first_row, row_count)` runs of adjacent rows.
fn row_runs(entries: &[TrackEntry]) -> Vec<(u64, u64)> {
    let mut runs: Vec<(u64, u64)> = Vec::new();
    for entry in entries {
        match runs.last_mut() {
            Some((first, count)) if first.checked_add(*count) == Some(entry.row) => *count += 1,
            _ => runs.push((entry.row, 1)),
        }
    }
    runs
}

fn open_data(path: &Path) -> Result<(File, Header), StorageError> {
    let corrupt = |reason: &str| StorageError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(corrupt("not a table directory")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::NotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    }

    let mut data = match File::open(data_path(path)) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(corrupt("data file is missing"));
        }
        Err(e) => return Err(e.into()),
    };

    let mut head = Vec::with_capacity(HEADER_LEN as usize);
    (&mut data).take(HEADER_LEN).read_to_end(&mut head)?;
    let header = Header::decode(&head, path)?;

    let Some(needed) = header
        .rows
        .checked_mul(ROW_LEN)
        .and_then(|body| body.checked_add(HEADER_LEN))
    else {
        return Err(corrupt("committed row count is out of range"));
    };
    if data.metadata()?.len() < needed {
        return Err(corrupt("data file is shorter than its committed rows"));
    }
    Ok((data, header))
}

fn check_index(
    path: &Path,
    header: &Header,
    frames: &[FrameRun],
    tracks: &[TrackEntry],
) -> Result<(), StorageError> {
    let indexed_rows: u64 = frames.iter().map(|r| r.row_count).sum();
    if indexed_rows != header.rows || tracks.len() as u64 != header.rows {
        return Err(StorageError::Corrupt {
            path: path.to_path_buf(),
            reason: format!(
                "indices cover {} rows but the table holds {}",
                indexed_rows, header.rows
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Point;
    use crate::linking::LinkedPoint;
    use crate::storage::TableWriter;

    fn linked(track_id: u32, x: f64) -> LinkedPoint {
        LinkedPoint {
            track_id,
            point: Point::new(x, 2.0 * x, 1.0, 0.5),
        }
    }

    /// Frames 1..=3; track 0 in every frame, track 1 only in frames 1 and 3.
    fn write_table(path: &Path, finalize: bool) {
        let mut writer = TableWriter::create(path, 8).unwrap();
        writer.append_frame(1, &[linked(0, 1.0), linked(1, 10.0)]).unwrap();
        writer.append_frame(2, &[linked(0, 1.5)]).unwrap();
        writer.append_frame(3, &[linked(0, 2.0), linked(1, 11.0)]).unwrap();
        if finalize {
            writer.finalize().unwrap();
        }
    }

    #[test]
    fn test_missing_table_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = TrackStore::new(dir.path().join("nothing.trk"));
        assert!(matches!(store.get_all(), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_corrupt_not_missing() {
        let dir = tempfile::tempdir().unwrap();

        let file = dir.path().join("file.trk");
        fs::write(&file, b"hello").unwrap();
        assert!(matches!(TrackTable::open(&file), Err(StorageError::Corrupt { .. })));

        let empty_dir = dir.path().join("empty.trk");
        fs::create_dir(&empty_dir).unwrap();
        assert!(matches!(TrackTable::open(&empty_dir), Err(StorageError::Corrupt { .. })));

        let bad_header = dir.path().join("bad.trk");
        fs::create_dir(&bad_header).unwrap();
        fs::write(data_path(&bad_header), vec![7u8; 64]).unwrap();
        assert!(matches!(TrackTable::open(&bad_header), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_indexed_and_scanned_reads_agree() {
        let dir = tempfile::tempdir().unwrap();
        let indexed = dir.path().join("indexed.trk");
        let partial = dir.path().join("partial.trk");
        write_table(&indexed, true);
        write_table(&partial, false);

        let a = TrackTable::open(&indexed).unwrap();
        let b = TrackTable::open(&partial).unwrap();
        assert!(a.is_indexed());
        assert!(!b.is_indexed());

        for frame in 0..=4 {
            assert_eq!(a.get_frame(frame).unwrap(), b.get_frame(frame).unwrap());
        }
        for track in 0..=2 {
            assert_eq!(a.get_track(track).unwrap(), b.get_track(track).unwrap());
        }
        assert_eq!(a.frames().unwrap(), vec![1, 2, 3]);
        assert_eq!(b.frames().unwrap(), vec![1, 2, 3]);
        assert_eq!(a.frame_range().unwrap(), 1..=3);
        assert_eq!(b.frame_range().unwrap(), 1..=3);
    }

    #[test]
    fn test_lookup_styles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.trk");
        write_table(&path, true);
        let store = TrackStore::new(&path);

        assert_eq!(store.get_frame(2).unwrap().len(), 1);
        assert!(store.get_frame(9).unwrap().is_empty());
        assert!(matches!(store.frame(9), Err(StorageError::FrameNotFound(9))));

        let track = store.get_track(1).unwrap();
        assert_eq!(track.iter().map(|r| r.frame).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(track[1].x, 11.0);

        let right_half = store.query(|row| row.x > 5.0).unwrap();
        assert_eq!(right_half.len(), 2);
        assert_eq!(store.row_count().unwrap(), 5);
        assert_eq!(store.max_frame().unwrap(), 3);
    }

    #[test]
    fn test_oversized_row_count_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.trk");
        fs::create_dir(&path).unwrap();
        let header = Header {
            rows: u64::MAX / 8,
            expected_rows: 0,
        };
        fs::write(data_path(&path), header.encode()).unwrap();

        assert!(matches!(TrackTable::open(&path), Err(StorageError::Corrupt { .. })));
        assert!(matches!(read_committed(&path), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_track_rows_split_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.trk");
        let mut writer = TableWriter::create(&path, 8).unwrap();
        writer.append_frame(1, &[linked(0, 1.0), linked(1, 10.0)]).unwrap();
        writer.append_frame(2, &[linked(1, 10.5)]).unwrap();
        writer.append_frame(3, &[linked(1, 11.0)]).unwrap();
        writer.append_frame(4, &[linked(0, 2.0), linked(1, 11.5)]).unwrap();
        writer.finalize().unwrap();

        let table = TrackTable::open(&path).unwrap();
        let entries = table.tracks.clone().unwrap();
        let track_one: Vec<TrackEntry> = entries.into_iter().filter(|e| e.track_id == 1).collect();
        assert_eq!(row_runs(&track_one), vec![(1, 3), (5, 1)]);

        let track = table.get_track(1).unwrap();
        assert_eq!(track.iter().map(|r| r.frame).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(track.iter().map(|r| r.x).collect::<Vec<_>>(), vec![10.0, 10.5, 11.0, 11.5]);
        assert_eq!(table.get_track(0).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_table_has_no_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.trk");
        TableWriter::create(&path, 0).unwrap().finalize().unwrap();

        let table = TrackTable::open(&path).unwrap();
        assert!(table.get_all().unwrap().is_empty());
        assert!(matches!(table.frame_range(), Err(StorageError::EmptyTable(_))));
    }

    #[test]
    fn test_session_sees_rows_committed_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.trk");
        let mut writer = TableWriter::create(&path, 8).unwrap();
        writer.append_frame(1, &[linked(0, 1.0)]).unwrap();

        let session = TrackTable::open(&path).unwrap();
        writer.append_frame(2, &[linked(0, 1.2)]).unwrap();

        assert_eq!(session.row_count(), 1);
        assert_eq!(session.get_all().unwrap().len(), 1);
        assert_eq!(TrackStore::new(&path).row_count().unwrap(), 2);
    }
}
