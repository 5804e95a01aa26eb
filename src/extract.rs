//! Input extraction: section-aware hashing for ELF binaries.
//!
//! Fuzzy hashes over whole executables are dominated by content that says
//! nothing about program behavior (symbol tables, string tables, debug
//! info, section headers). For ELF inputs only the content-bearing
//! sections are fed to the hash engines, concatenated in a fixed order so
//! the result is deterministic. Anything that is not a parseable ELF file
//! is hashed raw; the scan surface stays format-agnostic.

use std::borrow::Cow;

use object::{File, Object, ObjectSection};
use tracing::debug;

/// Content-bearing sections, in hashing order.
pub const HASHED_SECTIONS: [&str; 7] = [
    ".init", ".plt", ".plt.got", ".fini", ".text", ".rodata", ".data",
];

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";

/// Returns the bytes a hash engine should consume for `data`.
///
/// Borrows the input untouched unless it is an ELF file with at least one
/// of the [`HASHED_SECTIONS`] present and non-empty.
pub fn hashable_bytes(data: &[u8]) -> Cow<'_, [u8]> {
    if !data.starts_with(ELF_MAGIC) {
        return Cow::Borrowed(data);
    }
    match section_bytes(data) {
        Some(bytes) => {
            debug!(
                raw = data.len(),
                extracted = bytes.len(),
                "hashing ELF sections"
            );
            Cow::Owned(bytes)
        }
        // Truncated, exotic, or fully stripped: hash it like any other file
        None => Cow::Borrowed(data),
    }
}

fn section_bytes(data: &[u8]) -> Option<Vec<u8>> {
    let file = File::parse(data).ok()?;
    let mut out = Vec::new();
    for name in HASHED_SECTIONS {
        if let Some(section) = file.section_by_name(name) {
            if let Ok(bytes) = section.data() {
                out.extend_from_slice(bytes);
            }
        }
    }
    (!out.is_empty()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use object::write::Object as ObjectBuilder;
    use object::{Architecture, BinaryFormat, Endianness, SectionKind};

    fn build_elf(text: &[u8], rodata: &[u8], comment: &[u8]) -> Vec<u8> {
        let mut obj = ObjectBuilder::new(
            BinaryFormat::Elf,
            Architecture::X86_64,
            Endianness::Little,
        );
        let t = obj.add_section(vec![], b".text".to_vec(), SectionKind::Text);
        obj.append_section_data(t, text, 4);
        let r = obj.add_section(vec![], b".rodata".to_vec(), SectionKind::ReadOnlyData);
        obj.append_section_data(r, rodata, 4);
        let c = obj.add_section(vec![], b".comment".to_vec(), SectionKind::Note);
        obj.append_section_data(c, comment, 1);
        obj.write().unwrap()
    }

    #[test]
    fn test_non_elf_passes_through_untouched() {
        let data = b"plain text, hashed as-is";
        let bytes = hashable_bytes(data);
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&*bytes, data);
    }

    #[test]
    fn test_bad_elf_magic_falls_back_to_raw() {
        // Starts like an ELF but is unparseable garbage
        let mut data = b"\x7fELF".to_vec();
        data.extend_from_slice(&[0xAB; 16]);
        assert_eq!(&*hashable_bytes(&data), &data[..]);
    }

    #[test]
    fn test_elf_sections_are_extracted_in_order() {
        let text = b"machine code goes here";
        let rodata = b"constant strings";
        let elf = build_elf(text, rodata, b"compiler note");
        let bytes = hashable_bytes(&elf);
        let expected: Vec<u8> = [text.as_slice(), rodata.as_slice()].concat();
        assert_eq!(&*bytes, &expected[..]);
    }

    #[test]
    fn test_metadata_only_differences_vanish() {
        // Same code and data, different .comment: identical hash input
        let a = build_elf(b"code", b"data", b"built by gcc");
        let b = build_elf(b"code", b"data", b"built by clang");
        assert_ne!(a, b);
        assert_eq!(hashable_bytes(&a), hashable_bytes(&b));
    }

    #[test]
    fn test_code_differences_survive() {
        let a = build_elf(b"add eax, ebx", b"data", b"note");
        let b = build_elf(b"sub eax, ebx", b"data", b"note");
        assert_ne!(hashable_bytes(&a), hashable_bytes(&b));
    }
}
