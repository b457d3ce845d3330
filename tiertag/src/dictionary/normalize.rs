//! 語形の正規化
//!
//! 辞書の構築時と参照時に同じ関数を使う必要があります。
//! 正規化は小文字化と以下の文字同値表の適用からなります。
//!
//! | 入力 | 出力 |
//! |------|------|
//! | `ё` (`Ё`) | `е` |
//! | `‐` `‑` `‒` `–` `—` `―` `−` | `-` |
//! | `’` `‘` `ʼ` `` ` `` | `'` |

/// 語形を辞書参照用に正規化します。
///
/// この関数は冪等です。
///
/// # 例
///
/// ```
/// use tiertag::dictionary::normalize;
///
/// assert_eq!("еще", normalize("Ещё"));
/// assert_eq!("кто-то", normalize("Кто–то"));
/// ```
pub fn normalize(wordform: &str) -> String {
    let mut out = String::with_capacity(wordform.len());
    for c in wordform.chars() {
        for lc in c.to_lowercase() {
            out.push(map_equivalent(lc));
        }
    }
    out
}

#[inline(always)]
const fn map_equivalent(c: char) -> char {
    match c {
        'ё' => 'е',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => '-',
        '\u{2019}' | '\u{2018}' | '\u{02BC}' | '`' => '\'',
        c => c,
    }
}
