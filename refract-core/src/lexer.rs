//! Tokenizer for the GLSL subset.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{char, digit1, hex_digit1, one_of},
    combinator::{map, opt, recognize},
    sequence::{pair, preceded, tuple},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Struct,
    If,
    Else,
    For,
    While,
    Return,
    Break,
    Continue,
    Discard,
    Precision,
    Uniform,
    Attribute,
    Varying,
    Const,
    True,
    False,

    // Identifiers and literals. Type names (float, vec2, user structs)
    // arrive as identifiers; the parser tells them apart by position.
    Identifier(String),
    IntConstant(String),
    FloatConstant(String),

    // Operator symbols, lexed longest-spelling first
    Operator(String),

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Dot,
    Question,
    Colon,
}

fn identifier(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(pair(
        one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_"),
        nom::bytes::complete::take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)?;
    let token = match text {
        "struct" => Token::Struct,
        "if" => Token::If,
        "else" => Token::Else,
        "for" => Token::For,
        "while" => Token::While,
        "return" => Token::Return,
        "break" => Token::Break,
        "continue" => Token::Continue,
        "discard" => Token::Discard,
        "precision" => Token::Precision,
        "uniform" => Token::Uniform,
        "attribute" => Token::Attribute,
        "varying" => Token::Varying,
        "const" => Token::Const,
        "true" => Token::True,
        "false" => Token::False,
        _ => Token::Identifier(text.to_string()),
    };
    Ok((rest, token))
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn float_constant(input: &str) -> IResult<&str, Token> {
    let (rest, text) = alt((
        // 1.0, 1., 1.5e3, with optional f suffix
        recognize(tuple((
            digit1,
            char('.'),
            opt(digit1),
            opt(exponent),
            opt(one_of("fF")),
        ))),
        // .5, .5e-2
        recognize(tuple((char('.'), digit1, opt(exponent), opt(one_of("fF"))))),
        // 1e5
        recognize(tuple((digit1, exponent, opt(one_of("fF"))))),
    ))(input)?;
    Ok((rest, Token::FloatConstant(text.to_string())))
}

fn int_constant(input: &str) -> IResult<&str, Token> {
    let (rest, text) = alt((
        recognize(preceded(tag("0x"), hex_digit1)),
        recognize(preceded(tag("0X"), hex_digit1)),
        digit1,
    ))(input)?;
    Ok((rest, Token::IntConstant(text.to_string())))
}

fn operator(input: &str) -> IResult<&str, Token> {
    let (rest, text) = alt((
        alt((
            tag("++"),
            tag("--"),
            tag("+="),
            tag("-="),
            tag("*="),
            tag("/="),
            tag("=="),
            tag("!="),
            tag("<="),
            tag(">="),
            tag("&&"),
            tag("||"),
            tag("^^"),
            tag("<<"),
            tag(">>"),
        )),
        alt((
            tag("+"),
            tag("-"),
            tag("*"),
            tag("/"),
            tag("%"),
            tag("<"),
            tag(">"),
            tag("="),
            tag("!"),
            tag("~"),
            tag("&"),
            tag("|"),
            tag("^"),
        )),
    ))(input)?;
    Ok((rest, Token::Operator(text.to_string())))
}

fn delimiter(input: &str) -> IResult<&str, Token> {
    alt((
        map(char('('), |_| Token::LeftParen),
        map(char(')'), |_| Token::RightParen),
        map(char('{'), |_| Token::LeftBrace),
        map(char('}'), |_| Token::RightBrace),
        map(char('['), |_| Token::LeftBracket),
        map(char(']'), |_| Token::RightBracket),
        map(char(','), |_| Token::Comma),
        map(char(';'), |_| Token::Semicolon),
        map(char('.'), |_| Token::Dot),
        map(char('?'), |_| Token::Question),
        map(char(':'), |_| Token::Colon),
    ))(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    // Float before int (shared digit prefix), float before the dot
    // delimiter (`.5`).
    alt((identifier, float_constant, int_constant, operator, delimiter))(input)
}

/// Strip whitespace and comments from the front of the input.
fn skip_trivia(mut input: &str) -> Result<&str, String> {
    loop {
        let trimmed = input.trim_start();
        if let Some(rest) = trimmed.strip_prefix("//") {
            input = match rest.find('\n') {
                Some(pos) => &rest[pos + 1..],
                None => "",
            };
        } else if trimmed.starts_with("/*") {
            let (rest, _) = take_until::<_, _, nom::error::Error<&str>>("*/")(&trimmed[2..])
                .map_err(|_| "Unterminated block comment".to_string())?;
            input = &rest[2..];
        } else {
            return Ok(trimmed);
        }
    }
}

/// Tokenize GLSL source. The error is the offending source fragment.
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = input;
    loop {
        rest = skip_trivia(rest)?;
        if rest.is_empty() {
            break;
        }
        match token(rest) {
            Ok((remaining, tok)) => {
                tokens.push(tok);
                rest = remaining;
            }
            Err(_) => {
                let fragment: String = rest.chars().take(20).collect();
                return Err(format!("Unexpected character at '{}'", fragment));
            }
        }
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = tokenize("uniform float u_time;").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Uniform,
                Token::Identifier("float".to_string()),
                Token::Identifier("u_time".to_string()),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_float_forms() {
        let tokens = tokenize("1.0 .5 2. 1e5 3.5f").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::FloatConstant("1.0".to_string()),
                Token::FloatConstant(".5".to_string()),
                Token::FloatConstant("2.".to_string()),
                Token::FloatConstant("1e5".to_string()),
                Token::FloatConstant("3.5f".to_string()),
            ]
        );
    }

    #[test]
    fn test_int_forms() {
        let tokens = tokenize("42 0xFF").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::IntConstant("42".to_string()),
                Token::IntConstant("0xFF".to_string()),
            ]
        );
    }

    #[test]
    fn test_multi_character_operators_lex_greedily() {
        let tokens = tokenize("a += b++ <= c").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".to_string()),
                Token::Operator("+=".to_string()),
                Token::Identifier("b".to_string()),
                Token::Operator("++".to_string()),
                Token::Operator("<=".to_string()),
                Token::Identifier("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = tokenize("a // line\n/* block\nstill */ b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("a".to_string()),
                Token::Identifier("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment_errors() {
        assert!(tokenize("a /* no end").is_err());
    }

    #[test]
    fn test_swizzle_lexes_as_dot_then_identifier() {
        let tokens = tokenize("v.xyz").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Identifier("v".to_string()),
                Token::Dot,
                Token::Identifier("xyz".to_string()),
            ]
        );
    }
}
