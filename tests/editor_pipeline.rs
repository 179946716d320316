use proptest::prelude::*;

use synapse::editor::{Dispatch, Editor, InputEvent};
use synapse::surface::Tag;
use synapse::ui::layout::DocumentLayout;

fn type_text(editor: &mut Editor, text: &str) {
    for c in text.chars() {
        let mut event = if c == '\n' {
            InputEvent::newline()
        } else {
            InputEvent::insert_text(c.to_string())
        };
        editor.handle_input(&mut event);
    }
}

fn rows(editor: &Editor) -> Vec<String> {
    DocumentLayout::build(editor.surface().tree())
        .rows
        .iter()
        .map(|row| row.text())
        .collect()
}

#[test]
fn test_note_typed_from_scratch_matches_source() {
    let mut editor = Editor::open("").unwrap();
    editor.set_caret(0);
    type_text(
        &mut editor,
        "# Groceries\n\n- eggs\n- **fresh** bread\n\n> buy before noon",
    );
    assert_eq!(
        editor.text(),
        "# Groceries\n\n- eggs\n- **fresh** bread\n\n> buy before noon"
    );
    assert_eq!(editor.surface().tree().full_text(), editor.text());

    editor.clear_selection();
    assert_eq!(
        rows(&editor),
        vec!["Groceries", "", "• eggs", "• fresh bread", "", "│ buy before noon"]
    );
}

#[test]
fn test_only_touched_element_shows_source() {
    let mut editor = Editor::open("*one* and **two**\n").unwrap();
    editor.set_caret(2);
    assert_eq!(rows(&editor), vec!["*one* and two", ""]);
    editor.set_caret(14);
    assert_eq!(rows(&editor), vec!["one and **two**", ""]);
}

#[test]
fn test_editing_markup_rerenders_on_leave() {
    let mut editor = Editor::open("**bold** tail\n").unwrap();
    editor.set_caret(8);
    editor.handle_input(&mut InputEvent::delete_backward());
    assert_eq!(editor.text(), "**bold* tail\n");

    editor.set_caret(editor.text().len());
    assert_eq!(editor.surface().tree().full_text(), editor.text());
    let strong = editor
        .surface()
        .tree()
        .preorder(editor.surface().tree().root())
        .into_iter()
        .filter(|&id| {
            editor
                .surface()
                .tree()
                .element(id)
                .is_some_and(|element| element.tag == Tag::Strong)
        })
        .count();
    assert_eq!(strong, 0);
}

#[test]
fn test_loading_replaces_document_and_resets_state() {
    let mut editor = Editor::open("old text").unwrap();
    editor.set_caret(3);
    type_text(&mut editor, "!");
    assert!(editor.document().is_dirty());

    editor.load("# New\n").unwrap();
    assert_eq!(editor.text(), "# New\n");
    assert!(!editor.document().is_dirty());
    assert_eq!(editor.caret_offset(), None);
    assert!(editor.active().is_empty());
}

#[test]
fn test_code_span_source_appears_under_caret() {
    let mut editor = Editor::open("use `let x` here\n").unwrap();
    assert_eq!(rows(&editor), vec!["use let x here", ""]);
    editor.set_caret(7);
    assert_eq!(rows(&editor), vec!["use `let x` here", ""]);
    editor.clear_selection();
    assert_eq!(rows(&editor), vec!["use let x here", ""]);
}

fn letters(text: &str) -> String {
    text.chars().filter(char::is_ascii_alphanumeric).collect()
}

#[derive(Debug, Clone)]
enum Op {
    Type(String),
    Newline,
    Backspace,
    Delete,
    Caret(usize),
    Select(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::sample::select(vec!["a", "b", " ", "*", "_", "#", ">", "-", "`", "[", "]", "é", "1."])
            .prop_map(|s| Op::Type(s.to_string())),
        2 => Just(Op::Newline),
        2 => Just(Op::Backspace),
        1 => Just(Op::Delete),
        2 => (0usize..200).prop_map(Op::Caret),
        1 => (0usize..200, 0usize..200).prop_map(|(a, b)| Op::Select(a, b)),
    ]
}

fn floor_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset % (text.len() + 1);
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn surface_always_spells_out_the_document(
        seed in "[a-z *#>\\-\n]{0,40}",
        ops in prop::collection::vec(op(), 1..40),
    ) {
        let mut editor = Editor::open(&seed).unwrap();
        editor.set_caret(seed.len());
        for op in ops {
            let text = editor.text();
            let outcome = match op {
                Op::Type(s) => editor.handle_input(&mut InputEvent::insert_text(s)),
                Op::Newline => editor.handle_input(&mut InputEvent::newline()),
                Op::Backspace => editor.handle_input(&mut InputEvent::delete_backward()),
                Op::Delete => editor.handle_input(&mut InputEvent::delete_forward()),
                Op::Caret(at) => editor.set_caret(floor_boundary(&text, at)),
                Op::Select(a, b) => {
                    let (a, b) = (floor_boundary(&text, a), floor_boundary(&text, b));
                    editor.select(a.min(b)..a.max(b))
                }
            };
            prop_assert!(!matches!(outcome, Dispatch::Queued));
            prop_assert_eq!(editor.surface().tree().full_text(), editor.text());
            let caret = editor.caret_offset().unwrap_or(0);
            prop_assert!(caret <= editor.text().len());
        }

        editor.clear_selection();
        prop_assert_eq!(editor.surface().tree().full_text(), editor.text());
        let layout = DocumentLayout::build(editor.surface().tree());
        prop_assert!(layout.row_count() >= 1);
    }

    #[test]
    fn rendered_rows_keep_every_letter(
        text in "([a-z <>:/.@*_]{0,16}\n{0,2}){0,6}",
    ) {
        if let Ok(editor) = Editor::open(&text) {
            prop_assert_eq!(letters(&rows(&editor).concat()), letters(&text));
        }
    }
}
