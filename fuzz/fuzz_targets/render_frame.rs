#![no_main]

use std::borrow::Cow;

use errstack::{Flags, FuncInfo, Render as _, Verb, short_function_name};
use libfuzzer_sys::fuzz_target;

const VERBS: [Verb; 5] = [Verb::Short, Verb::Value, Verb::Line, Verb::Name, Verb::Quoted];

fuzz_target!(|input: (String, u32, String)| {
    let (function, line, file) = input;

    let short = short_function_name(&function);
    assert!(short.len() <= function.len());

    let info = FuncInfo {
        file: Cow::Owned(file),
        line,
        function: Cow::Owned(function),
    };
    for verb in VERBS {
        for flags in [Flags::empty(), Flags::PLUS, Flags::SHARP, Flags::all()] {
            std::hint::black_box(info.render(verb, flags));
        }
    }
    assert_eq!(info.render(Verb::Line, Flags::empty()), line.to_string());
});
