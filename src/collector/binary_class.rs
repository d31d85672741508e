//! `BinaryClassCollector`: reads compiled `.class` bytes, including entries
//! inside `.jar`/`.war`/`.ear` archives, and yields `JavaClassNode` nodes
//! with a `ClassOrigin::Binary` marker.
//!
//! Only enough of the class file header is parsed to name the class and its
//! supertype/interfaces — magic number, the constant pool's `Utf8` and
//! `Class` entries, `this_class`, `super_class`, `interfaces`. Method and
//! field tables, attributes, and bytecode are never read. This is a
//! heuristic reader, not a verifier: malformed input is reported, not
//! panicked on.

use std::io::Read;
use std::path::PathBuf;

use tracing::warn;
use zip::ZipArchive;

use crate::collector::{CollectionContext, Collector};
use crate::error::CollectionError;
use crate::graph::node::{ClassOrigin, JavaClassNode};
use crate::graph::{GraphNode, NodeKind};

const CLASS_MAGIC: u32 = 0xCAFE_BABE;

pub struct BinaryClassCollector;

impl BinaryClassCollector {
    pub fn new() -> Self {
        Self
    }

    fn archive_extension(path: &std::path::Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()),
            Some(ref e) if e == "jar" || e == "war" || e == "ear"
        )
    }
}

impl Default for BinaryClassCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector<PathBuf, GraphNode> for BinaryClassCollector {
    fn can_collect(&self, input: &PathBuf) -> bool {
        let is_class = input.extension().map(|e| e == "class").unwrap_or(false);
        is_class || Self::archive_extension(input)
    }

    fn collect(&self, input: &PathBuf, ctx: &CollectionContext) -> Result<Vec<GraphNode>, CollectionError> {
        if Self::archive_extension(input) {
            return self.collect_from_archive(input, ctx);
        }

        let bytes = std::fs::read(input).map_err(|source| CollectionError::UnreadableFile {
            path: input.display().to_string(),
            source,
        })?;

        match parse_class_file(&bytes) {
            Ok(class) => {
                if ctx.already_collected(&class.fully_qualified_name) {
                    Ok(Vec::new())
                } else {
                    let fqn = class.fully_qualified_name.clone();
                    Ok(vec![GraphNode::new(fqn.clone(), NodeKind::JavaClassNode(class), fqn)])
                }
            }
            Err(message) => Err(CollectionError::MalformedArchiveEntry {
                archive: input.display().to_string(),
                entry: input.display().to_string(),
                message,
            }),
        }
    }
}

impl BinaryClassCollector {
    /// Iterate `.class` entries inside a `.jar`/`.war`/`.ear` archive.
    /// An entry that fails to parse is skipped and logged; it does not
    /// abort collection of the remaining entries in the same archive.
    fn collect_from_archive(
        &self,
        archive_path: &PathBuf,
        ctx: &CollectionContext,
    ) -> Result<Vec<GraphNode>, CollectionError> {
        let file = std::fs::File::open(archive_path).map_err(|source| CollectionError::UnreadableFile {
            path: archive_path.display().to_string(),
            source,
        })?;

        let mut archive = ZipArchive::new(file).map_err(|err| CollectionError::MalformedArchiveEntry {
            archive: archive_path.display().to_string(),
            entry: String::new(),
            message: err.to_string(),
        })?;

        let mut nodes = Vec::new();
        for i in 0..archive.len() {
            let mut entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(archive = %archive_path.display(), index = i, error = %err, "binary_class_collector: unreadable archive entry");
                    continue;
                }
            };

            if !entry.name().ends_with(".class") {
                continue;
            }
            let entry_name = entry.name().to_string();

            let mut bytes = Vec::with_capacity(entry.size() as usize);
            if let Err(err) = entry.read_to_end(&mut bytes) {
                warn!(archive = %archive_path.display(), entry = %entry_name, error = %err, "binary_class_collector: failed reading entry");
                continue;
            }

            match parse_class_file(&bytes) {
                Ok(class) => {
                    if !ctx.already_collected(&class.fully_qualified_name) {
                        let fqn = class.fully_qualified_name.clone();
                        nodes.push(GraphNode::new(fqn.clone(), NodeKind::JavaClassNode(class), fqn));
                    }
                }
                Err(message) => {
                    warn!(archive = %archive_path.display(), entry = %entry_name, message, "binary_class_collector: malformed class entry skipped");
                }
            }
        }

        Ok(nodes)
    }
}

/// A read cursor over class file bytes with big-endian fixed-width reads.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn u1(&mut self) -> Result<u8, String> {
        let b = *self.bytes.get(self.pos).ok_or("unexpected end of class file")?;
        self.pos += 1;
        Ok(b)
    }

    fn u2(&mut self) -> Result<u16, String> {
        let hi = self.u1()? as u16;
        let lo = self.u1()? as u16;
        Ok((hi << 8) | lo)
    }

    fn u4(&mut self) -> Result<u32, String> {
        let hi = self.u2()? as u32;
        let lo = self.u2()? as u32;
        Ok((hi << 16) | lo)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self.pos.checked_add(len).ok_or("length overflow")?;
        let slice = self.bytes.get(self.pos..end).ok_or("unexpected end of class file")?;
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize) -> Result<(), String> {
        self.bytes(len)?;
        Ok(())
    }
}

enum CpEntry {
    Utf8(String),
    Class { name_index: u16 },
    Other,
}

fn parse_class_file(bytes: &[u8]) -> Result<JavaClassNode, String> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.u4()?;
    if magic != CLASS_MAGIC {
        return Err(format!("bad magic number: {magic:#x}"));
    }
    let _minor = cursor.u2()?;
    let _major = cursor.u2()?;

    let pool_count = cursor.u2()? as usize;
    let mut pool: Vec<CpEntry> = Vec::with_capacity(pool_count);
    pool.push(CpEntry::Other); // index 0 is unused

    let mut index = 1;
    while index < pool_count {
        let tag = cursor.u1()?;
        match tag {
            1 => {
                let len = cursor.u2()? as usize;
                let raw = cursor.bytes(len)?;
                let text = String::from_utf8_lossy(raw).to_string();
                pool.push(CpEntry::Utf8(text));
                index += 1;
            }
            7 | 16 | 19 | 20 => {
                let name_index = cursor.u2()?;
                pool.push(CpEntry::Class { name_index });
                index += 1;
            }
            8 => {
                cursor.skip(2)?;
                pool.push(CpEntry::Other);
                index += 1;
            }
            3 | 4 => {
                cursor.skip(4)?;
                pool.push(CpEntry::Other);
                index += 1;
            }
            5 | 6 => {
                cursor.skip(8)?;
                // Longs/doubles occupy two constant pool slots.
                pool.push(CpEntry::Other);
                pool.push(CpEntry::Other);
                index += 2;
            }
            9 | 10 | 11 | 12 | 17 | 18 => {
                cursor.skip(4)?;
                pool.push(CpEntry::Other);
                index += 1;
            }
            15 => {
                cursor.skip(3)?;
                pool.push(CpEntry::Other);
                index += 1;
            }
            other => return Err(format!("unknown constant pool tag {other} at index {index}")),
        }
    }

    let resolve_class_name = |pool: &[CpEntry], class_index: u16| -> Option<String> {
        let class_entry = pool.get(class_index as usize)?;
        let name_index = match class_entry {
            CpEntry::Class { name_index } => *name_index,
            _ => return None,
        };
        match pool.get(name_index as usize)? {
            CpEntry::Utf8(s) => Some(s.replace('/', ".")),
            _ => None,
        }
    };

    let _access_flags = cursor.u2()?;
    let this_class_index = cursor.u2()?;
    let super_class_index = cursor.u2()?;

    let fully_qualified_name =
        resolve_class_name(&pool, this_class_index).ok_or("this_class did not resolve to a name")?;
    let parent_class = if super_class_index == 0 {
        None
    } else {
        resolve_class_name(&pool, super_class_index)
    };

    let interfaces_count = cursor.u2()? as usize;
    let mut interfaces = Vec::with_capacity(interfaces_count);
    for _ in 0..interfaces_count {
        let iface_index = cursor.u2()?;
        if let Some(name) = resolve_class_name(&pool, iface_index) {
            interfaces.push(name);
        }
    }

    let (package, simple_name) = match fully_qualified_name.rsplit_once('.') {
        Some((pkg, simple)) => (pkg.to_string(), simple.to_string()),
        None => (String::new(), fully_qualified_name.clone()),
    };

    Ok(JavaClassNode {
        fully_qualified_name,
        simple_name,
        package,
        origin: ClassOrigin::Binary,
        parent_class,
        interfaces,
    })
}
