//! Lexical analyzer shared by indexing and querying.
//!
//! Splitting and the alphanumeric check follow Unicode: `"café"` is a token,
//! and a no-break space separates words like any other whitespace.
use std::str::CharIndices;

use tantivy::tokenizer::{LowerCaser, TextAnalyzer, Token, TokenFilter, TokenStream, Tokenizer};

/// Splits on every `char::is_whitespace` character.
#[derive(Clone, Default)]
pub struct UnicodeWhitespaceTokenizer {
	token: Token,
}

pub struct UnicodeWhitespaceTokenStream<'a> {
	text: &'a str,
	chars: CharIndices<'a>,
	token: &'a mut Token,
}

impl Tokenizer for UnicodeWhitespaceTokenizer {
	type TokenStream<'a> = UnicodeWhitespaceTokenStream<'a>;

	fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
		self.token.reset();
		UnicodeWhitespaceTokenStream { text, chars: text.char_indices(), token: &mut self.token }
	}
}

impl UnicodeWhitespaceTokenStream<'_> {
	fn token_end(&mut self) -> usize {
		(&mut self.chars)
			.find(|(_, c)| c.is_whitespace())
			.map_or(self.text.len(), |(offset, _)| offset)
	}
}

impl TokenStream for UnicodeWhitespaceTokenStream<'_> {
	fn advance(&mut self) -> bool {
		self.token.text.clear();
		self.token.position = self.token.position.wrapping_add(1);
		while let Some((offset_from, c)) = self.chars.next() {
			if !c.is_whitespace() {
				let offset_to = self.token_end();
				self.token.offset_from = offset_from;
				self.token.offset_to = offset_to;
				self.token.text.push_str(&self.text[offset_from..offset_to]);
				return true;
			}
		}
		false
	}

	fn token(&self) -> &Token { self.token }

	fn token_mut(&mut self) -> &mut Token { self.token }
}

/// Drops every token containing a character that is not `char::is_alphanumeric`.
#[derive(Clone)]
pub struct AlphanumericOnly;

impl TokenFilter for AlphanumericOnly {
	type Tokenizer<T: Tokenizer> = AlphanumericOnlyWrapper<T>;

	fn transform<T: Tokenizer>(self, tokenizer: T) -> Self::Tokenizer<T> { AlphanumericOnlyWrapper(tokenizer) }
}

#[derive(Clone)]
pub struct AlphanumericOnlyWrapper<T>(T);

impl<T: Tokenizer> Tokenizer for AlphanumericOnlyWrapper<T> {
	type TokenStream<'a> = AlphanumericOnlyStream<T::TokenStream<'a>>;

	fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
		AlphanumericOnlyStream { tail: self.0.token_stream(text) }
	}
}

pub struct AlphanumericOnlyStream<T> {
	tail: T,
}

impl<T: TokenStream> TokenStream for AlphanumericOnlyStream<T> {
	fn advance(&mut self) -> bool {
		while self.tail.advance() {
			let text = &self.tail.token().text;
			if !text.is_empty() && text.chars().all(char::is_alphanumeric) {
				return true;
			}
		}
		false
	}

	fn token(&self) -> &Token { self.tail.token() }

	fn token_mut(&mut self) -> &mut Token { self.tail.token_mut() }
}

/// Whitespace split, lowercase, then drop every token that is not purely alphanumeric.
///
/// `"Section 17.4.2 applies."` yields `["section"]`: punctuation glued to a
/// word removes the whole token rather than being stripped from it.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(UnicodeWhitespaceTokenizer::default())
		.filter(LowerCaser)
		.filter(AlphanumericOnly)
		.build()
}

pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut tokens = Vec::new();
	while let Some(token) = stream.next() { tokens.push(token.text.clone()); }
	tokens
}
