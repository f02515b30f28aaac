//! page-flow CLI (for testing purposes only)
//! The main interface is through WASM bindings.

use page_flow::{
    Block, Document, FrameOutcome, MeasureStrategy, PageSize, PagedEditor, PaginatorConfig,
    Transaction,
};

fn sample_document() -> Document {
    let mut blocks = vec![Block::heading(1, "Pagination demo")];
    for section in 1..=6 {
        blocks.push(Block::heading(2, format!("Section {section}")));
        blocks.push(Block::paragraph(
            "This paragraph stands in for body text that wraps across several lines. ".repeat(6),
        ));
        blocks.push(Block::bullet_list(["First point", "Second point", "Third point"]));
        blocks.push(Block::code_block("fn main() {\n    println!(\"hello\");\n}"));
        blocks.push(Block::table(vec![
            vec!["Name".into(), "Value".into()],
            vec!["alpha".into(), "1".into()],
            vec!["beta".into(), "2".into()],
        ]));
        blocks.push(Block::horizontal_rule());
    }
    Document::from_blocks(blocks)
}

fn main() -> page_flow::Result<()> {
    env_logger::init();

    println!("page-flow pagination engine");
    println!("===========================");

    let config = PaginatorConfig {
        strategy: MeasureStrategy::Heuristic,
        ..Default::default()
    };
    let mut editor = PagedEditor::with_document(sample_document(), config)?;

    for size in PageSize::ALL {
        editor.paginator_mut().set_page_size(size.key(), 0)?;
        editor.recalculate(None);
        let paginator = editor.paginator();
        println!();
        println!(
            "{:<7} content height {:>6}px, {} page(s), container {}px",
            size.key(),
            paginator.geometry().content_height,
            paginator.total_pages(),
            paginator.container_min_height()
        );
        for range in paginator.page_ranges() {
            println!("  page {:>2}: positions {:?}", range.page_number, range.range());
        }
    }

    // Simulated typing: the scheduler debounces the burst into one pass
    let mut now = 1_000;
    editor.start(now);
    for _ in 0..5 {
        now += 40;
        editor.apply(&Transaction::new().insert_text(1, "typed "), now)?;
    }
    let outcome = loop {
        now += 50;
        if let Some(outcome) = editor.tick(now, None) {
            break outcome;
        }
    };
    match outcome {
        FrameOutcome::Committed(commit) => {
            println!();
            println!(
                "revision {} at {}ms: {} page(s), {} overlay patch(es)",
                commit.revision,
                now,
                commit.total_pages,
                commit.diff.patch_count()
            );
        }
        other => println!("frame: {other:?}"),
    }

    Ok(())
}
