//! The candidate layout handed to the validator.
//!
//! A [`CandidateSaveLayout`] is a plain snapshot: which members sit in the
//! metadata container, how big they are, which user-data paths exist and
//! the save's declared size.  Archive readers elsewhere produce it; for an
//! unpacked savegame on disk, [`CandidateSaveLayout::from_dir`] does the job.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;
use thiserror::Error;

use crate::constraints::{PixelFormat, ICON0_NAME, SCE_SYS_NAME};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const PNG_IHDR_TAG:  [u8; 4] = *b"IHDR";

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Savegame directory not found: {0}")]
    NotADirectory(PathBuf),
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// One file inside the metadata container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberEntry {
    pub name:         String,
    pub size:         u64,
    /// Known only for image members whose header could be read.
    pub pixel_format: Option<PixelFormat>,
}

impl MemberEntry {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size, pixel_format: None }
    }

    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = Some(format);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CandidateSaveLayout {
    pub members:       Vec<MemberEntry>,
    /// User-data paths relative to the save root, `/`-separated.
    pub user_files:    Vec<String>,
    pub declared_size: u64,
    /// Symbolic links found under the root.  They are neither followed nor
    /// counted in `declared_size`.
    pub skipped_links: Vec<String>,
}

impl CandidateSaveLayout {
    pub fn new(declared_size: u64) -> Self {
        Self { declared_size, ..Default::default() }
    }

    pub fn with_member(mut self, member: MemberEntry) -> Self {
        self.members.push(member);
        self
    }

    pub fn with_user_file(mut self, path: impl Into<String>) -> Self {
        self.user_files.push(path.into());
        self
    }

    pub fn member(&self, name: &str) -> Option<&MemberEntry> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Snapshot an unpacked savegame directory.
    ///
    /// Files under `sce_sys/` become members; everything else becomes a user
    /// file.  The declared size is the sum of all file sizes.  Symbolic links
    /// are listed in `skipped_links` and otherwise ignored.
    pub fn from_dir<P: AsRef<Path>>(root: P) -> Result<Self, LayoutError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(LayoutError::NotADirectory(root.to_owned()));
        }

        let mut layout = Self::default();
        let sys_dir = root.join(SCE_SYS_NAME);
        if sys_dir.is_dir() {
            for entry in fs::read_dir(&sys_dir)? {
                let entry = entry?;
                let meta = fs::symlink_metadata(entry.path())?;
                if meta.file_type().is_symlink() {
                    layout.skip_link(root, &entry.path())?;
                    continue;
                }
                if !meta.is_file() { continue; }
                let name = utf8_name(&entry.path())?;
                let mut member = MemberEntry::new(name, meta.len());
                if member.name == ICON0_NAME {
                    member.pixel_format = png_dimensions(&entry.path())?;
                }
                layout.declared_size += meta.len();
                layout.members.push(member);
            }
        }
        layout.members.sort_by(|a, b| a.name.cmp(&b.name));

        let mut stack = vec![root.to_owned()];
        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path == sys_dir { continue; }
                let meta = fs::symlink_metadata(&path)?;
                if meta.file_type().is_symlink() {
                    layout.skip_link(root, &path)?;
                } else if meta.is_dir() {
                    stack.push(path);
                } else {
                    layout.declared_size += meta.len();
                    layout.user_files.push(relative_path(root, &path)?);
                }
            }
        }
        layout.user_files.sort();
        layout.skipped_links.sort();

        tracing::debug!(
            root = %root.display(),
            members = layout.members.len(),
            user_files = layout.user_files.len(),
            size = layout.declared_size,
            skipped_links = layout.skipped_links.len(),
            "layout read from directory",
        );
        Ok(layout)
    }

    fn skip_link(&mut self, root: &Path, path: &Path) -> Result<(), LayoutError> {
        let rel = relative_path(root, path)?;
        tracing::debug!(path = %rel, "symbolic link skipped");
        self.skipped_links.push(rel);
        Ok(())
    }
}

// ── helpers ──────────────────────────────────────────────────────────────────

/// Width and height from a PNG's IHDR chunk, or `None` if the file is not a
/// PNG.
pub fn png_dimensions(path: &Path) -> Result<Option<PixelFormat>, LayoutError> {
    Ok(read_png_header(BufReader::new(File::open(path)?))?)
}

/// Signature, IHDR length and tag, then width and height, all big-endian.
/// A short or foreign header yields `None`.
fn read_png_header<R: Read>(mut reader: R) -> io::Result<Option<PixelFormat>> {
    match read_ihdr(&mut reader) {
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        other => other,
    }
}

fn read_ihdr<R: Read>(reader: &mut R) -> io::Result<Option<PixelFormat>> {
    let mut signature = [0u8; 8];
    reader.read_exact(&mut signature)?;
    if signature != PNG_SIGNATURE {
        return Ok(None);
    }
    let _chunk_len = reader.read_u32::<BigEndian>()?;
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    if tag != PNG_IHDR_TAG {
        return Ok(None);
    }
    let width  = reader.read_u32::<BigEndian>()?;
    let height = reader.read_u32::<BigEndian>()?;
    Ok(Some(PixelFormat { width, height }))
}

fn utf8_name(path: &Path) -> Result<String, LayoutError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| LayoutError::NonUtf8Path(path.to_owned()))
}

fn relative_path(root: &Path, path: &Path) -> Result<String, LayoutError> {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str().ok_or_else(|| LayoutError::NonUtf8Path(path.to_owned())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("/"))
}
