use crate::constants::{TOKEN_MIN_EXCLUSIVE_LEN, TOKEN_SEPARATORS};

/// Split `text` into lower-cased keyword tokens.
///
/// `/`, `_` and `-` act as separators alongside whitespace, and one-byte
/// fragments are dropped. Length is measured in UTF-8 bytes, so a single
/// CJK or accented character is kept. The index and the query side both go
/// through this function, so anything it derives from a command's name,
/// description or category finds that command again.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| c.is_whitespace() || TOKEN_SEPARATORS.contains(&c))
        .filter(|w| w.len() > TOKEN_MIN_EXCLUSIVE_LEN)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_separators() {
        assert_eq!(
            tokenize("OS/Linux net_tools Git-LFS"),
            vec!["os", "linux", "net", "tools", "git", "lfs"]
        );
    }

    #[test]
    fn drops_single_character_tokens() {
        assert_eq!(tokenize("a b cd -x e"), vec!["cd"]);
    }

    #[test]
    fn empty_and_separator_only_inputs_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  /_-  ").is_empty());
    }

    #[test]
    fn keeps_duplicates_in_order() {
        assert_eq!(tokenize("ls lists ls"), vec!["ls", "lists", "ls"]);
    }

    #[test]
    fn length_is_measured_in_bytes() {
        assert_eq!(tokenize("é"), vec!["é"]);
        assert_eq!(tokenize("查找 文 本 x"), vec!["查找", "文", "本"]);
    }
}
