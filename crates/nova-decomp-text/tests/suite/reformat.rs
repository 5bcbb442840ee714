use nova_decomp_text::{TextBuffer, TextConfig, TextError};
use pretty_assertions::assert_eq;

fn narrow() -> TextConfig {
    TextConfig {
        indent: "  ".to_string(),
        line_separator: "\n".to_string(),
        preferred_line_length: 10,
    }
}

fn call(buf: &mut TextBuffer, first: &str, second: &str) {
    buf.append("foo(");
    buf.push_newline_group(0, 1);
    buf.append_possible_newline("");
    buf.append(first).append(",");
    buf.append_possible_newline(" ");
    buf.add_bytecode_mapping([3]);
    buf.append(second);
    buf.append_possible_newline_dedent("");
    buf.pop_newline_group().unwrap();
    buf.append(");");
}

#[test]
fn long_group_breaks_at_every_marked_position() {
    let mut buf = TextBuffer::new(narrow());
    call(&mut buf, "argument1", "argument2");
    buf.reformat().unwrap();
    assert_eq!(buf.as_str(), "foo(\n  argument1,\n  argument2\n);");
}

#[test]
fn short_group_stays_flat() {
    let mut buf = TextBuffer::new(narrow());
    call(&mut buf, "a", "b");
    buf.reformat().unwrap();
    assert_eq!(buf.as_str(), "foo(a, b);");
}

#[test]
fn bytecode_mappings_follow_inserted_lines() {
    let mut buf = TextBuffer::new(narrow());
    buf.add_start_bytecode_mapping([0]);
    call(&mut buf, "argument1", "argument2");
    buf.reformat().unwrap();
    assert_eq!(buf.line_mapping(), vec![(0, 0), (3, 2)]);
}

#[test]
fn appended_buffers_keep_their_groups() {
    let mut inner = TextBuffer::new(narrow());
    call(&mut inner, "argument1", "argument2");

    let mut outer = inner.sibling();
    outer.append("x = ");
    outer.append_buffer(&inner).unwrap();
    outer.reformat().unwrap();
    assert_eq!(outer.as_str(), "x = foo(\n  argument1,\n  argument2\n);");
}

#[test]
fn appending_a_buffer_with_an_open_group_fails() {
    let mut inner = TextBuffer::new(narrow());
    inner.push_newline_group(0, 1);
    let mut outer = inner.sibling();
    assert_eq!(outer.append_buffer(&inner).err(), Some(TextError::OpenGroup));
}
