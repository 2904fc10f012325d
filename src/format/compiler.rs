//! Format Compiler
//!
//! Groups lexer tokens into directives the evaluator can run without looking
//! ahead: literal runs are attached to the conversion they surround, each
//! select knows whether it descends, and the argument slots are listed in
//! order so argument lists can be checked before anything runs.

use super::lexer::{tokenize, Conversion, Size, Spec, Target, Token};
use crate::error::Result;

/// When a matched select pushes a frame for its markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    Never,
    /// Elements always; any markup for `^*`
    IfElement,
    /// Any markup, for a following `%F`
    Always,
}

/// Compiled directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Select {
        target: Target,
        optional: bool,
        descend: Descend,
    },
    Close,
    Convert {
        spec: Spec,
        /// Literal text that must precede the value
        prefix: Vec<u8>,
        /// Literal text that must follow the value
        suffix: Vec<u8>,
    },
}

impl Directive {
    /// Number of arguments this directive consumes
    #[inline]
    pub fn slots(&self) -> usize {
        match self {
            Directive::Select { target, .. } => usize::from(target.takes_name()),
            Directive::Close => 0,
            Directive::Convert { .. } => 1,
        }
    }
}

/// Expected argument kind, in argument order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Name,
    Text { alloc: bool },
    Signed(Size),
    Unsigned(Size),
    Float(Size),
    Char,
    Callback,
}

/// Compiled format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub directives: Vec<Directive>,
    pub slots: Vec<Slot>,
}

impl Format {
    /// Compile a format string
    pub fn compile(format: &str) -> Result<Self> {
        let mut directives = Vec::new();
        let mut run: Vec<u8> = Vec::new();
        // Conversion still waiting for its suffix
        let mut open: Option<usize> = None;

        for token in tokenize(format)? {
            match token {
                Token::Literal(b) => run.push(b),
                Token::Select { target, optional } => {
                    close_run(&mut directives, &mut open, &mut run);
                    directives.push(Directive::Select {
                        target,
                        optional,
                        descend: Descend::Never,
                    });
                }
                Token::Close => {
                    close_run(&mut directives, &mut open, &mut run);
                    directives.push(Directive::Close);
                }
                Token::Convert(spec) => {
                    // Text between two conversions belongs to the first one
                    let prefix = if open.is_some() {
                        close_run(&mut directives, &mut open, &mut run);
                        Vec::new()
                    } else {
                        std::mem::take(&mut run)
                    };
                    open = Some(directives.len());
                    directives.push(Directive::Convert {
                        spec,
                        prefix,
                        suffix: Vec::new(),
                    });
                }
            }
        }
        close_run(&mut directives, &mut open, &mut run);

        let rules: Vec<Descend> = (0..directives.len())
            .map(|i| match directives.get(i + 1) {
                None | Some(Directive::Select { .. }) | Some(Directive::Close) => Descend::IfElement,
                Some(Directive::Convert { spec, .. }) if spec.conversion == Conversion::Callback => {
                    Descend::Always
                }
                Some(Directive::Convert { .. }) => Descend::Never,
            })
            .collect();
        for (directive, rule) in directives.iter_mut().zip(rules) {
            if let Directive::Select { descend, .. } = directive {
                *descend = rule;
            }
        }

        let slots = directives.iter().filter_map(slot_of).collect();
        Ok(Format { directives, slots })
    }
}

/// Hand the pending literal run to the open conversion as its suffix, or drop it.
fn close_run(directives: &mut [Directive], open: &mut Option<usize>, run: &mut Vec<u8>) {
    let text = std::mem::take(run);
    if let Some(Directive::Convert { suffix, .. }) = open.take().and_then(|i| directives.get_mut(i)) {
        *suffix = text;
    }
}

fn slot_of(directive: &Directive) -> Option<Slot> {
    match directive {
        Directive::Select { target, .. } => target.takes_name().then_some(Slot::Name),
        Directive::Close => None,
        Directive::Convert { spec, .. } => Some(match spec.conversion {
            Conversion::Str | Conversion::Path => Slot::Text { alloc: spec.alloc },
            Conversion::Int(_) => Slot::Signed(spec.size),
            Conversion::Unsigned(_) => Slot::Unsigned(spec.size),
            Conversion::Float => Slot::Float(spec.size),
            Conversion::Char => Slot::Char,
            Conversion::Callback => Slot::Callback,
        }),
    }
}
