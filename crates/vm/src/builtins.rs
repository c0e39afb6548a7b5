//! Builtin dispatch: the strict stack calling convention every entry
//! follows — pop exactly `argc` arguments (pushed left-to-right, so the
//! last argument is on top), push exactly one result — and the behavior
//! of each builtin, grounded in the reference standard library.

use std::io::{self, BufRead, Write};

use ocl_core::builtins::lookup_by_id;
use ocl_core::{SourceLocation, Value};

use crate::vm::Vm;

/// Pop `argc` values off the stack in argument order (arg0 first).
fn pop_args(vm: &mut Vm, argc: u32) -> Vec<Value> {
    let mut args = Vec::with_capacity(argc as usize);
    for _ in 0..argc {
        args.push(vm.pop());
    }
    args.reverse();
    args
}

fn to_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Bool(b) => if *b { 1.0 } else { 0.0 },
        _ => 0.0,
    }
}

fn to_i64(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        Value::Float(f) => *f as i64,
        Value::Bool(b) => if *b { 1 } else { 0 },
        _ => 0,
    }
}

fn to_str(v: &Value) -> String {
    v.to_display_string()
}

/// Dispatch a `CallBuiltin` instruction. `argc` values have already been
/// pushed by the caller in left-to-right order; this pops exactly that
/// many and pushes exactly one result, even for builtins (`exit`,
/// `assert`) that also set `halted`.
pub fn dispatch(vm: &mut Vm, id: u32, argc: u32, location: &SourceLocation) {
    let Some(entry) = lookup_by_id(id) else {
        let args = pop_args(vm, argc);
        let _ = args;
        eprintln!("RUNTIME ERROR: Unknown built-in id {} [{}]", id, location);
        vm.push(Value::Null);
        return;
    };

    if !entry.arity.accepts(argc as usize) {
        let args = pop_args(vm, argc);
        let _ = args;
        eprintln!(
            "RUNTIME ERROR: built-in '{}' called with {} argument(s) [{}]",
            entry.name, argc, location
        );
        vm.push(Value::Null);
        return;
    }

    let args = pop_args(vm, argc);
    let result = match entry.name {
        "print" => {
            for a in &args {
                print!("{}", to_str(a));
            }
            println!();
            Value::Null
        }
        "printf" => {
            builtin_printf(&args);
            Value::Null
        }
        "input" => builtin_input(None),
        "readLine" => builtin_input(None),
        "abs" => match &args[0] {
            Value::Int(i) => Value::Int(i.abs()),
            other => Value::Float(to_f64(other).abs()),
        },
        "sqrt" => {
            let x = to_f64(&args[0]);
            if x < 0.0 {
                eprintln!("RUNTIME ERROR: sqrt of negative number [{}]", location);
                Value::Float(0.0)
            } else {
                Value::Float(x.sqrt())
            }
        }
        "pow" => Value::Float(to_f64(&args[0]).powf(to_f64(&args[1]))),
        "sin" => Value::Float(to_f64(&args[0]).sin()),
        "cos" => Value::Float(to_f64(&args[0]).cos()),
        "tan" => Value::Float(to_f64(&args[0]).tan()),
        "floor" => Value::Float(to_f64(&args[0]).floor()),
        "ceil" => Value::Float(to_f64(&args[0]).ceil()),
        "round" => Value::Float(to_f64(&args[0]).round()),
        "max" => builtin_minmax(&args, true),
        "min" => builtin_minmax(&args, false),
        "strLen" => Value::Int(to_str(&args[0]).chars().count() as i64),
        "substr" => builtin_substr(&args),
        "toUpperCase" => Value::str(to_str(&args[0]).to_uppercase()),
        "toLowerCase" => Value::str(to_str(&args[0]).to_lowercase()),
        "strContains" => Value::Bool(to_str(&args[0]).contains(&to_str(&args[1]))),
        "strIndexOf" => match to_str(&args[0]).find(&to_str(&args[1])) {
            Some(byte_idx) => Value::Int(to_str(&args[0])[..byte_idx].chars().count() as i64),
            None => Value::Int(-1),
        },
        "strReplace" => builtin_str_replace(&args),
        "strTrim" => Value::str(to_str(&args[0]).trim().to_string()),
        "strSplit" => {
            let s = to_str(&args[0]);
            let delim = to_str(&args[1]);
            let count = if delim.is_empty() {
                if s.is_empty() { 0 } else { 1 }
            } else {
                s.split(delim.as_str()).filter(|p| !p.is_empty()).count()
            };
            Value::Int(count as i64)
        }
        "toInt" => Value::Int(to_i64(&args[0])),
        "toFloat" => Value::Float(to_f64(&args[0])),
        "toString" => Value::str(to_str(&args[0])),
        "toBool" => Value::Bool(args[0].is_truthy()),
        "typeOf" => Value::str(args[0].type_name()),
        "exit" => {
            let code = args.first().map(|v| to_i64(v) as i32).unwrap_or(0);
            vm.halt(code);
            Value::Null
        }
        "assert" => {
            if !args[0].is_truthy() {
                match args.get(1) {
                    Some(msg) => eprintln!("ASSERTION FAILED: {}", to_str(msg)),
                    None => eprintln!("ASSERTION FAILED"),
                }
                vm.halt(1);
            }
            Value::Null
        }
        "isNull" => Value::Bool(matches!(args[0], Value::Null)),
        "isInt" => Value::Bool(matches!(args[0], Value::Int(_))),
        "isFloat" => Value::Bool(matches!(args[0], Value::Float(_))),
        "isString" => Value::Bool(matches!(args[0], Value::Str(_))),
        "isBool" => Value::Bool(matches!(args[0], Value::Bool(_))),
        other => unreachable!("builtin catalogue and dispatch arms are out of sync: {other}"),
    };
    vm.push(result);
}

fn builtin_minmax(args: &[Value], want_max: bool) -> Value {
    if args.len() < 2 {
        return args.first().cloned().unwrap_or(Value::Null);
    }
    let all_int = args.iter().all(|v| matches!(v, Value::Int(_)));
    if all_int {
        let ints = args.iter().map(to_i64);
        let chosen = if want_max { ints.max() } else { ints.min() };
        Value::Int(chosen.unwrap())
    } else {
        let floats = args.iter().map(to_f64);
        let chosen = if want_max {
            floats.fold(f64::NEG_INFINITY, f64::max)
        } else {
            floats.fold(f64::INFINITY, f64::min)
        };
        Value::Float(chosen)
    }
}

fn builtin_substr(args: &[Value]) -> Value {
    let s: Vec<char> = to_str(&args[0]).chars().collect();
    let len = s.len() as i64;
    let mut start = to_i64(&args[1]);
    if start < 0 {
        start = 0;
    }
    if start >= len {
        return Value::str("");
    }
    let requested_len = args.get(2).map(to_i64).unwrap_or(len - start);
    let mut end = start + requested_len.max(0);
    if end > len {
        end = len;
    }
    let out: String = s[start as usize..end as usize].iter().collect();
    Value::str(out)
}

fn builtin_str_replace(args: &[Value]) -> Value {
    let src = to_str(&args[0]);
    let old = to_str(&args[1]);
    let new = to_str(&args[2]);
    if old.is_empty() {
        return Value::str(src);
    }
    Value::str(src.replace(old.as_str(), new.as_str()))
}

fn builtin_input(prompt: Option<&str>) -> Value {
    if let Some(p) = prompt {
        print!("{}", p);
        let _ = io::stdout().flush();
    }
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) => Value::str(""),
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Value::str(line)
        }
        Err(_) => Value::str(""),
    }
}

/// `printf`: first argument is the format string, remaining arguments are
/// consumed in order by `%d %i %f %s %c %b %%` specifiers; `\n \t \r \\`
/// escapes are recognized in the format string itself.
fn builtin_printf(args: &[Value]) {
    let Some(fmt_arg) = args.first() else { return };
    let fmt = to_str(fmt_arg);
    let mut rest = args[1..].iter();
    let mut chars = fmt.chars().peekable();
    let mut out = String::new();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some(other) => out.push(other),
                None => {}
            }
            continue;
        }
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d') | Some('i') => {
                let v = rest.next();
                out.push_str(&v.map(to_i64).unwrap_or(0).to_string());
            }
            Some('f') => {
                let v = rest.next();
                match v {
                    Some(Value::Int(i)) => out.push_str(&(*i as f64).to_string()),
                    Some(Value::Float(f)) => out.push_str(&f.to_string()),
                    Some(other) => out.push_str(&to_str(other)),
                    None => out.push('0'),
                }
            }
            Some('s') => {
                let v = rest.next();
                out.push_str(&v.map(to_str).unwrap_or_default());
            }
            Some('c') => {
                if let Some(Value::Char(c)) = rest.next() {
                    out.push(*c);
                }
            }
            Some('b') => {
                let v = rest.next();
                out.push_str(if v.map(|v| v.is_truthy()).unwrap_or(false) { "true" } else { "false" });
            }
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    print!("{}", out);
}
