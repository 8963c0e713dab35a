//! Fold a rendered line to a width bound.
//!
//! Width counts visible runes; ANSI escapes are zero-width atoms and
//! are never split. Breaks land on the last space that fits; a word
//! wider than a whole line is split on a rune boundary with a trailing
//! `\` and the continuation carries a single-space indent. Space runs
//! between words keep their exact width, so padded columns stay
//! aligned.

/// One unsplittable piece: a visible char or a whole escape sequence.
struct Atom<'a> {
    text: &'a str,
    width: usize,
}

fn atoms(line: &str) -> Vec<Atom<'_>> {
    let mut out = Vec::new();
    let mut iter = line.char_indices().peekable();

    while let Some((start, c)) = iter.next() {
        if c == '\x1b' {
            // Consume through the terminating letter of the CSI code.
            let mut end = start + c.len_utf8();
            if matches!(iter.peek(), Some((_, '['))) {
                for (i, next) in iter.by_ref() {
                    end = i + next.len_utf8();
                    if next != '[' && next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
            out.push(Atom {
                text: &line[start..end],
                width: 0,
            });
        } else {
            out.push(Atom {
                text: &line[start..start + c.len_utf8()],
                width: 1,
            });
        }
    }
    out
}

/// A word plus the exact run of spaces that preceded it.
struct Segment<'a> {
    spaces: usize,
    word: Vec<Atom<'a>>,
}

fn segments<'a>(atoms: Vec<Atom<'a>>) -> Vec<Segment<'a>> {
    let mut out: Vec<Segment<'a>> = Vec::new();
    let mut spaces = 0usize;
    let mut current: Vec<Atom<'a>> = Vec::new();

    for atom in atoms {
        if atom.width == 1 && atom.text == " " {
            if !current.is_empty() {
                out.push(Segment {
                    spaces,
                    word: std::mem::take(&mut current),
                });
                spaces = 0;
            }
            spaces += 1;
        } else {
            current.push(atom);
        }
    }
    if !current.is_empty() {
        out.push(Segment {
            spaces,
            word: current,
        });
    }
    out
}

fn word_width(word: &[Atom<'_>]) -> usize {
    word.iter().map(|a| a.width).sum()
}

/// Fold one logical line into physical lines of at most `max_len`
/// visible runes.
///
/// The line's leading indent (child tasks) survives on the first
/// physical line; continuations carry a single-space indent.
pub fn fold(line: &str, max_len: usize) -> Vec<String> {
    if max_len < 3 {
        return vec![line.to_string()];
    }

    let indent: String = line.chars().take_while(|c| *c == ' ').collect();
    let body = &line[indent.len()..];

    let mut out = Vec::new();
    let mut cur = indent.clone();
    let mut cur_width = indent.len();

    for segment in segments(atoms(body)) {
        let w = word_width(&segment.word);
        let sep = segment.spaces;

        if cur_width + sep + w <= max_len {
            for _ in 0..sep {
                cur.push(' ');
            }
            cur_width += sep;
            for atom in &segment.word {
                cur.push_str(atom.text);
            }
            cur_width += w;
            continue;
        }

        // Fits on a fresh continuation line: break at the space run.
        if 1 + w <= max_len {
            out.push(std::mem::take(&mut cur));
            cur.push(' ');
            cur_width = 1;
            for atom in &segment.word {
                cur.push_str(atom.text);
            }
            cur_width += w;
            continue;
        }

        // Wider than a whole line: split in place on rune boundaries.
        for _ in 0..sep {
            cur.push(' ');
        }
        cur_width += sep;
        let mut i = 0;
        while i < segment.word.len() {
            let remaining: usize = segment.word[i..].iter().map(|a| a.width).sum();
            if cur_width + remaining <= max_len {
                for atom in &segment.word[i..] {
                    cur.push_str(atom.text);
                }
                cur_width += remaining;
                break;
            }
            // Fill up to max_len - 1 and mark the break.
            while i < segment.word.len() {
                if segment.word[i].width == 0 {
                    cur.push_str(segment.word[i].text);
                    i += 1;
                    continue;
                }
                if cur_width >= max_len - 1 {
                    break;
                }
                cur.push_str(segment.word[i].text);
                cur_width += 1;
                i += 1;
            }
            cur.push('\\');
            out.push(std::mem::take(&mut cur));
            cur.push(' ');
            cur_width = 1;
        }
    }

    out.push(cur);
    out
}
