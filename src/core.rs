use camino::Utf8Path;

/// A 32-byte BLAKE3 hash used to fingerprint task inputs.
///
/// Generation tasks store the fingerprint of everything that influences
/// their output, and compare it on the next run to decide whether the task
/// is up to date.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Hash32([u8; 32]);

impl<T> From<T> for Hash32
where
    T: Into<[u8; 32]>,
{
    fn from(value: T) -> Self {
        Hash32(value.into())
    }
}

impl Hash32 {
    pub(crate) fn hash_file(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        Ok(blake3::Hasher::new().update_mmap(path)?.finalize().into())
    }

    pub(crate) fn to_hex(self) -> String {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let mut acc = String::with_capacity(64);

        for byte in self.0 {
            acc.push(HEX[(byte >> 4) as usize] as char);
            acc.push(HEX[(byte & 0xF) as usize] as char);
        }

        acc
    }
}

impl std::fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}

/// Incremental fingerprint over labelled fields.
///
/// Every field is length-prefixed, so `("ab", "c")` and `("a", "bc")` never
/// produce the same hash.
#[derive(Default)]
pub(crate) struct Fingerprint(blake3::Hasher);

impl Fingerprint {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn field(&mut self, label: &str, value: impl AsRef<[u8]>) -> &mut Self {
        for part in [label.as_bytes(), value.as_ref()] {
            self.0.update(&(part.len() as u64).to_le_bytes());
            self.0.update(part);
        }
        self
    }

    pub(crate) fn path(&mut self, label: &str, path: &Utf8Path) -> &mut Self {
        self.field(label, path.as_str())
    }

    pub(crate) fn finish(&self) -> Hash32 {
        self.0.finalize().into()
    }
}

/// Upper-cases the first character, leaving the rest untouched.
///
/// `"main"` becomes `"Main"`, `"integrationTest"` becomes
/// `"IntegrationTest"`, and the empty string stays empty.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("main"), "Main");
        assert_eq!(capitalize("integrationTest"), "IntegrationTest");
        assert_eq!(capitalize("Main"), "Main");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("ßig"), "SSig");
    }

    #[test]
    fn test_hex() {
        let hash = Hash32::from([0xAB; 32]);
        assert_eq!(hash.to_hex(), "ab".repeat(32));
    }

    #[test]
    fn test_fingerprint_fields_are_delimited() {
        let a = Fingerprint::new().field("x", "ab").field("y", "c").finish();
        let b = Fingerprint::new().field("x", "a").field("y", "bc").finish();
        assert_ne!(a, b);

        let c = Fingerprint::new().field("x", "ab").field("y", "c").finish();
        assert_eq!(a, c);
    }
}
