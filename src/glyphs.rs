use ratatui::text::{Line, Span};
use ratatui::widgets::Cell;

use crate::context::TreeRowContext;
use crate::model::TreeModel;
use crate::store::{MessageTree, NodeId};

#[derive(Clone, Copy)]
pub struct TreeGlyphs<'a> {
    pub indent: &'a str,
    pub branch_last: &'a str,
    pub branch: &'a str,
    pub vert: &'a str,
    pub empty: &'a str,
    pub leaf: &'a str,
    pub expanded: &'a str,
    pub collapsed: &'a str,
}

impl TreeGlyphs<'static> {
    pub const fn unicode() -> Self {
        Self {
            indent: "   ",
            branch_last: "└──",
            branch: "├──",
            vert: "│  ",
            empty: "   ",
            leaf: "•",
            expanded: "▼",
            collapsed: "▶",
        }
    }

    pub const fn ascii() -> Self {
        Self {
            indent: "   ",
            branch_last: "`--",
            branch: "|--",
            vert: "|  ",
            empty: "   ",
            leaf: "*",
            expanded: "v",
            collapsed: ">",
        }
    }
}

/// Text shown for a node; empty text renders the placeholder.
#[derive(Clone, Copy)]
pub struct TreeLabelParts<'a> {
    pub text: &'a str,
}

pub trait TreeLabelProvider<T: TreeModel> {
    fn label_parts<'a>(&'a self, model: &'a T, id: T::Id) -> TreeLabelParts<'a>;
}

pub trait TreeLabelRenderer<T: TreeModel> {
    fn cell<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a>;
}

impl<T, P> TreeLabelRenderer<T> for P
where
    T: TreeModel,
    P: TreeLabelProvider<T>,
{
    fn cell<'a>(
        &'a self,
        model: &'a T,
        id: T::Id,
        ctx: &TreeRowContext,
        glyphs: &TreeGlyphs<'a>,
    ) -> Cell<'a> {
        let parts = self.label_parts(model, id);
        tree_name_cell(ctx, parts, glyphs)
    }
}

/// Label provider showing each message's first content line.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageLabel;

impl TreeLabelProvider<MessageTree> for MessageLabel {
    fn label_parts<'a>(&'a self, model: &'a MessageTree, id: NodeId) -> TreeLabelParts<'a> {
        let text = model
            .content(id)
            .and_then(|content| content.lines().next())
            .unwrap_or_default();
        TreeLabelParts { text }
    }
}

const fn expander<'a>(ctx: &TreeRowContext<'_>, glyphs: &TreeGlyphs<'a>) -> &'a str {
    if ctx.has_children {
        if ctx.is_collapsed {
            glyphs.collapsed
        } else {
            glyphs.expanded
        }
    } else if ctx.level == 0 {
        ""
    } else {
        glyphs.leaf
    }
}

fn push_content<'a>(spans: &mut Vec<Span<'a>>, ctx: &TreeRowContext<'_>, text: &'a str) {
    if let Some((before, after)) = ctx.editing {
        let mut rest = after.chars();
        let under_cursor = rest.next().map_or_else(|| " ".to_string(), String::from);
        spans.push(Span::raw(before.to_owned()));
        spans.push(Span::styled(under_cursor, ctx.cursor_style));
        spans.push(Span::raw(rest.as_str().to_owned()));
        return;
    }

    let span = if text.trim().is_empty() {
        Span::styled(ctx.placeholder.to_owned(), ctx.placeholder_style)
    } else {
        Span::raw(text)
    };
    if ctx.is_invalid {
        spans.push(span.patch_style(ctx.invalid_style));
    } else {
        spans.push(span);
    }
}

pub fn tree_label_line<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelParts<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Line<'a> {
    let mut spans = Vec::with_capacity(ctx.is_tail_stack.len() + 8);

    if ctx.level == 0 || !ctx.draw_lines {
        for _ in 0..ctx.level {
            spans.push(Span::raw(glyphs.empty));
        }
    } else {
        for (l, is_last) in ctx.is_tail_stack.iter().enumerate() {
            let part = if l == (ctx.level as usize) - 1 {
                if *is_last {
                    glyphs.branch_last
                } else {
                    glyphs.branch
                }
            } else if *is_last {
                glyphs.indent
            } else {
                glyphs.vert
            };
            spans.push(Span::styled(part, ctx.line_style));
        }
    }

    let expander = expander(ctx, glyphs);
    if !expander.is_empty() {
        spans.push(Span::raw(expander));
        spans.push(Span::raw(" "));
    }

    if let Some(position) = ctx.position {
        spans.push(Span::styled(position.to_string(), ctx.badge_style));
        spans.push(Span::raw(" "));
    }

    push_content(&mut spans, ctx, parts.text);
    Line::from(spans)
}

pub fn tree_name_cell<'a>(
    ctx: &TreeRowContext<'_>,
    parts: TreeLabelParts<'a>,
    glyphs: &TreeGlyphs<'a>,
) -> Cell<'a> {
    Cell::from(tree_label_line(ctx, parts, glyphs))
}
