//! Mutable file tree of one archive handle, plus conversion to and from
//! committed object graphs.

use std::collections::BTreeMap;

use arblog_store::{Blob, EntryMode, ObjectStore, Tree, TreeEntry};
use arblog_types::ObjectId;

use crate::clock::from_millis;
use crate::error::{ArchiveError, ArchiveResult};
use crate::path;
use crate::types::{DirEntry, FileKind, Stat};

#[derive(Clone, Debug, PartialEq, Eq)]
enum NodeKind {
    File { blob: ObjectId, size: u64 },
    Directory,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Node {
    kind: NodeKind,
    ctime_ms: i64,
    mtime_ms: i64,
}

impl Node {
    fn stat(&self) -> Stat {
        let (kind, size) = match self.kind {
            NodeKind::File { size, .. } => (FileKind::File, size),
            NodeKind::Directory => (FileKind::Directory, 0),
        };
        Stat {
            kind,
            size,
            ctime: from_millis(self.ctime_ms),
            mtime: from_millis(self.mtime_ms),
        }
    }

    fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

/// Every file and directory keyed by normalized path. The root (`""`) is
/// implicit and always a directory.
#[derive(Clone, Debug, Default)]
pub(crate) struct WorkTree {
    nodes: BTreeMap<String, Node>,
}

fn not_found(path: &str) -> ArchiveError {
    ArchiveError::NotFound {
        path: path.to_string(),
    }
}

impl WorkTree {
    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.nodes.get(path).is_some_and(Node::is_dir)
    }

    /// Paths strictly below `dir`, in lexical order.
    fn descendants<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = (&'a String, &'a Node)> + 'a {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };
        self.nodes
            .range(prefix.clone()..)
            .take_while(move |(k, _)| k.starts_with(&prefix))
            .filter(move |(k, _)| !k.is_empty() && k.len() > dir.len())
    }

    fn blob_of(&self, path: &str) -> ArchiveResult<ObjectId> {
        match self.nodes.get(path) {
            Some(Node {
                kind: NodeKind::File { blob, .. },
                ..
            }) => Ok(*blob),
            Some(_) => Err(ArchiveError::IsADirectory {
                path: path.to_string(),
            }),
            None => Err(not_found(path)),
        }
    }

    pub fn read(&self, store: &dyn ObjectStore, path: &str) -> ArchiveResult<Vec<u8>> {
        let id = self.blob_of(path)?;
        let blob = Blob::from_stored_object(&store.require(&id)?)?;
        Ok(blob.data)
    }

    pub fn stat(&self, path: &str, now_ms: i64) -> ArchiveResult<Stat> {
        if path.is_empty() {
            return Ok(Node {
                kind: NodeKind::Directory,
                ctime_ms: now_ms,
                mtime_ms: now_ms,
            }
            .stat());
        }
        self.nodes.get(path).map(Node::stat).ok_or_else(|| not_found(path))
    }

    pub fn readdir(&self, dir: &str, recursive: bool, with_stat: bool) -> ArchiveResult<Vec<DirEntry>> {
        if !dir.is_empty() {
            match self.nodes.get(dir) {
                None => return Err(not_found(dir)),
                Some(node) if !node.is_dir() => {
                    return Err(ArchiveError::NotADirectory {
                        path: dir.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        let skip = if dir.is_empty() { 0 } else { dir.len() + 1 };
        Ok(self
            .descendants(dir)
            .map(|(full, node)| (&full[skip..], node))
            .filter(|(rel, _)| recursive || !rel.contains('/'))
            .map(|(rel, node)| DirEntry {
                name: rel.to_string(),
                stat: with_stat.then(|| node.stat()),
            })
            .collect())
    }

    fn ensure_parents(&mut self, path: &str, now_ms: i64) -> ArchiveResult<()> {
        let mut missing = Vec::new();
        let mut cursor = path::parent(path);
        while let Some(dir) = cursor {
            if dir.is_empty() {
                break;
            }
            match self.nodes.get(dir) {
                Some(node) if node.is_dir() => break,
                Some(_) => {
                    return Err(ArchiveError::NotADirectory {
                        path: dir.to_string(),
                    })
                }
                None => missing.push(dir.to_string()),
            }
            cursor = path::parent(dir);
        }
        for dir in missing {
            self.nodes.insert(
                dir,
                Node {
                    kind: NodeKind::Directory,
                    ctime_ms: now_ms,
                    mtime_ms: now_ms,
                },
            );
        }
        Ok(())
    }

    pub fn write(
        &mut self,
        store: &dyn ObjectStore,
        path: &str,
        data: &[u8],
        now_ms: i64,
    ) -> ArchiveResult<()> {
        if path.is_empty() || self.is_dir(path) {
            return Err(ArchiveError::IsADirectory {
                path: path.to_string(),
            });
        }
        self.ensure_parents(path, now_ms)?;
        let blob = store.write(&Blob::new(data.to_vec()).to_stored_object())?;
        let ctime_ms = self.nodes.get(path).map_or(now_ms, |n| n.ctime_ms);
        self.nodes.insert(
            path.to_string(),
            Node {
                kind: NodeKind::File {
                    blob,
                    size: data.len() as u64,
                },
                ctime_ms,
                mtime_ms: now_ms,
            },
        );
        Ok(())
    }

    pub fn unlink(&mut self, path: &str) -> ArchiveResult<()> {
        self.blob_of(path)?;
        self.nodes.remove(path);
        Ok(())
    }

    pub fn mkdir(&mut self, path: &str, now_ms: i64) -> ArchiveResult<()> {
        if path.is_empty() || self.nodes.contains_key(path) {
            return Err(ArchiveError::AlreadyExists {
                path: path.to_string(),
            });
        }
        if let Some(parent) = path::parent(path) {
            if !self.is_dir(parent) {
                return Err(if self.nodes.contains_key(parent) {
                    ArchiveError::NotADirectory {
                        path: parent.to_string(),
                    }
                } else {
                    not_found(parent)
                });
            }
        }
        self.nodes.insert(
            path.to_string(),
            Node {
                kind: NodeKind::Directory,
                ctime_ms: now_ms,
                mtime_ms: now_ms,
            },
        );
        Ok(())
    }

    pub fn rmdir(&mut self, path: &str, recursive: bool) -> ArchiveResult<()> {
        if path.is_empty() {
            return Err(ArchiveError::InvalidPath {
                path: "/".into(),
                reason: "cannot remove the archive root".into(),
            });
        }
        match self.nodes.get(path) {
            None => return Err(not_found(path)),
            Some(node) if !node.is_dir() => {
                return Err(ArchiveError::NotADirectory {
                    path: path.to_string(),
                })
            }
            Some(_) => {}
        }
        let below: Vec<String> = self.descendants(path).map(|(k, _)| k.clone()).collect();
        if !below.is_empty() && !recursive {
            return Err(ArchiveError::DirectoryNotEmpty {
                path: path.to_string(),
            });
        }
        for key in below {
            self.nodes.remove(&key);
        }
        self.nodes.remove(path);
        Ok(())
    }

    /// Total file bytes and file count.
    pub fn usage(&self) -> (u64, usize) {
        self.nodes
            .values()
            .filter_map(|n| match n.kind {
                NodeKind::File { size, .. } => Some(size),
                NodeKind::Directory => None,
            })
            .fold((0, 0), |(bytes, count), size| (bytes + size, count + 1))
    }

    /// Write the tree rooted at `dir` into the store and return its id.
    pub fn snapshot(&self, store: &dyn ObjectStore, dir: &str) -> ArchiveResult<ObjectId> {
        let skip = if dir.is_empty() { 0 } else { dir.len() + 1 };
        let mut entries = Vec::new();
        for (full, node) in self.descendants(dir) {
            let name = &full[skip..];
            if name.contains('/') {
                continue;
            }
            entries.push(match node.kind {
                NodeKind::File { blob, .. } => {
                    TreeEntry::file(name, blob, node.ctime_ms, node.mtime_ms)
                }
                NodeKind::Directory => {
                    TreeEntry::directory(name, self.snapshot(store, full)?, node.ctime_ms)
                }
            });
        }
        Ok(store.write(&Tree::new(entries).to_stored_object()?)?)
    }

    /// Rebuild a work tree from a committed root tree.
    pub fn checkout(store: &dyn ObjectStore, root: &ObjectId) -> ArchiveResult<Self> {
        let mut tree = Self::default();
        tree.checkout_into(store, root, "")?;
        Ok(tree)
    }

    fn checkout_into(&mut self, store: &dyn ObjectStore, id: &ObjectId, dir: &str) -> ArchiveResult<()> {
        let listing = Tree::from_stored_object(&store.require(id)?)?;
        for entry in listing.entries {
            let full = path::join(dir, &entry.name);
            match entry.mode {
                EntryMode::File => {
                    let size = store.require(&entry.object_id)?.size;
                    self.nodes.insert(
                        full,
                        Node {
                            kind: NodeKind::File {
                                blob: entry.object_id,
                                size,
                            },
                            ctime_ms: entry.ctime_ms,
                            mtime_ms: entry.mtime_ms,
                        },
                    );
                }
                EntryMode::Directory => {
                    self.nodes.insert(
                        full.clone(),
                        Node {
                            kind: NodeKind::Directory,
                            ctime_ms: entry.ctime_ms,
                            mtime_ms: entry.mtime_ms,
                        },
                    );
                    self.checkout_into(store, &entry.object_id, &full)?;
                }
            }
        }
        Ok(())
    }
}
