//! Source positions of values, keyed by JSON pointer.
//!
//! Only run on input that already parsed, so the scanner stays permissive and
//! simply stops if it meets something unexpected.

use std::collections::HashMap;

use crate::schema::compile::escape_pointer;

/// 1-based `(line, column)` of the first character of every value.
pub fn value_positions(source: &[u8]) -> HashMap<String, (usize, usize)> {
    let mut scanner = Scanner {
        source,
        pos: 0,
        line: 1,
        column: 1,
        positions: HashMap::new(),
    };
    let _ = scanner.value(String::new());
    scanner.positions
}

struct Scanner<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    positions: HashMap<String, (usize, usize)>,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else if (byte & 0xC0) != 0x80 {
            self.column += 1;
        }
        Some(byte)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.bump();
        }
    }

    fn value(&mut self, pointer: String) -> Option<()> {
        self.skip_whitespace();
        self.positions.insert(pointer.clone(), (self.line, self.column));
        match self.peek()? {
            b'{' => self.object(pointer),
            b'[' => self.array(pointer),
            b'"' => self.string().map(|_| ()),
            _ => {
                while !matches!(
                    self.peek(),
                    None | Some(b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r')
                ) {
                    self.bump();
                }
                Some(())
            }
        }
    }

    fn object(&mut self, pointer: String) -> Option<()> {
        self.bump();
        self.skip_whitespace();
        if self.peek()? == b'}' {
            self.bump();
            return Some(());
        }
        loop {
            self.skip_whitespace();
            let raw = self.string()?;
            let key: String = serde_json::from_slice(raw).ok()?;
            self.skip_whitespace();
            if self.bump()? != b':' {
                return None;
            }
            self.value(format!("{}/{}", pointer, escape_pointer(&key)))?;
            self.skip_whitespace();
            match self.bump()? {
                b',' => continue,
                b'}' => return Some(()),
                _ => return None,
            }
        }
    }

    fn array(&mut self, pointer: String) -> Option<()> {
        self.bump();
        self.skip_whitespace();
        if self.peek()? == b']' {
            self.bump();
            return Some(());
        }
        let mut index = 0;
        loop {
            self.value(format!("{}/{}", pointer, index))?;
            index += 1;
            self.skip_whitespace();
            match self.bump()? {
                b',' => continue,
                b']' => return Some(()),
                _ => return None,
            }
        }
    }

    /// Raw string token including quotes.
    fn string(&mut self) -> Option<&'a [u8]> {
        let start = self.pos;
        if self.bump()? != b'"' {
            return None;
        }
        loop {
            match self.bump()? {
                b'\\' => {
                    self.bump()?;
                }
                b'"' => return Some(&self.source[start..self.pos]),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_of_nested_values() {
        let source = br#"{
  "metadata": {
    "title": "T"
  },
  "content": {"sections": [1, {"id": "s1"}]}
}"#;
        let positions = value_positions(source);
        assert_eq!(positions[""], (1, 1));
        assert_eq!(positions["/metadata"], (2, 15));
        assert_eq!(positions["/metadata/title"], (3, 14));
        assert_eq!(positions["/content/sections"], (5, 27));
        assert_eq!(positions["/content/sections/1/id"], (5, 38));
    }

    #[test]
    fn test_escaped_keys_and_strings() {
        let source = br#"{"a/b": "x\"y", "c": 1}"#;
        let positions = value_positions(source);
        assert!(positions.contains_key("/a~1b"));
        assert_eq!(positions["/c"], (1, 22));
    }

    #[test]
    fn test_multibyte_columns_count_characters() {
        let source = "{\"é\": 1}".as_bytes();
        let positions = value_positions(source);
        assert_eq!(positions["/é"], (1, 7));
    }
}
