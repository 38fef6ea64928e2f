use std::collections::HashMap;

/// Character-keyed prefix tree over dictionary words.
///
/// The downstream segmenter walks the tree one character at a time while
/// scanning an input sentence, so every prefix of an inserted word must be
/// reachable as a path from the root. Nodes are append-only: a generation's
/// trie is discarded wholesale on reload, never mutated after publication.
#[derive(Debug, Clone, Default)]
pub struct Trie {
	children: HashMap<char, Trie>,
	is_word: bool,
}

impl Trie {
	#[must_use]
	pub fn new() -> Self {
		Self {
			children: HashMap::new(),
			is_word: false,
		}
	}

	/// Inserts the full character sequence of `word`, creating intermediate
	/// nodes on demand and marking the final node terminal. Idempotent.
	pub fn insert(&mut self, word: &str) {
		let mut current = self;
		for ch in word.chars() {
			current = current.children.entry(ch).or_default();
		}
		current.is_word = true;
	}

	/// Child node for the next character, if any.
	#[must_use]
	pub fn child(&self, ch: char) -> Option<&Trie> {
		self.children.get(&ch)
	}

	/// Whether a dictionary word ends at this node.
	#[must_use]
	pub fn is_word(&self) -> bool {
		self.is_word
	}

	/// Walks `prefix` from this node, returning the node it ends on.
	#[must_use]
	pub fn walk(&self, prefix: &str) -> Option<&Trie> {
		let mut current = self;
		for ch in prefix.chars() {
			current = current.child(ch)?;
		}
		Some(current)
	}

	/// Whether `word` was inserted as a complete dictionary word.
	#[must_use]
	pub fn contains(&self, word: &str) -> bool {
		self.walk(word).is_some_and(Trie::is_word)
	}
}
