use chrono::Utc;
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Dynamic, Engine, ImmutableString, Scope, AST, FLOAT, INT};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use super::{EvalError, ExpressionEvaluator};

/// Operators (and nesting tokens) allowed in one expression
pub const MAX_OPERATORS: usize = 64;

const MAX_EXPR_DEPTH: usize = 64;
const MAX_OPERATIONS: u64 = 10_000;

/// Name under which the whole record is visible, unless the record has a
/// field of that name
const RECORD_VAR: &str = "data";

/// Default evaluator: `rhai` expressions over the fields of the record.
///
/// Top-level fields are variables, nested fields are reached with `.`, and
/// names missing from the record read as `()` (`null`). Compiled
/// expressions are cached.
pub struct Interpreter {
    engine: Engine,
    cache: Mutex<HashMap<String, AST>>,
}

impl Interpreter {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine
            .set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH)
            .set_max_operations(MAX_OPERATIONS);

        #[allow(deprecated)]
        engine.on_var(|name, _, context| {
            Ok((!context.scope().contains(name)).then_some(Dynamic::UNIT))
        });

        engine
            .register_fn("lower", |s: ImmutableString| s.to_lowercase())
            .register_fn("upper", |s: ImmutableString| s.to_uppercase())
            .register_fn("round", |x: FLOAT, places: INT| {
                let factor = 10f64.powi(places.clamp(0, 15) as i32);
                (x * factor).round() / factor
            })
            .register_fn("coalesce", |a: Dynamic, b: Dynamic| if a.is_unit() { b } else { a })
            .register_fn("today", || Utc::now().date_naive().format("%Y-%m-%d").to_string());

        Self {
            engine,
            cache: Mutex::default(),
        }
    }

    fn compile(&self, expression: &str) -> Result<AST, EvalError> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(ast) = cache.get(expression) {
                return Ok(ast.clone());
            }
        }

        let operators = operator_count(expression);
        if operators > MAX_OPERATORS {
            return Err(EvalError::TooComplex {
                operators,
                limit: MAX_OPERATORS,
            });
        }

        let ast = self.engine.compile_expression(expression)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(expression.to_string(), ast.clone());
        }
        Ok(ast)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.cache.lock().map(|cache| cache.len()).unwrap_or(0);
        f.debug_struct("Interpreter").field("cached", &cached).finish()
    }
}

impl ExpressionEvaluator for Interpreter {
    fn evaluate_value(&self, expression: &str, data: &Value) -> Result<Value, EvalError> {
        let ast = self.compile(expression)?;
        let mut scope = scope_for(data)?;
        let result = self.engine.eval_ast_with_scope::<Dynamic>(&mut scope, &ast)?;
        Ok(from_dynamic::<Value>(&result)?)
    }
}

fn scope_for(data: &Value) -> Result<Scope<'static>, EvalError> {
    let mut scope = Scope::new();
    if let Value::Object(fields) = data {
        for (name, value) in fields {
            scope.push_dynamic(name.as_str(), to_dynamic(value)?);
        }
        if !fields.contains_key(RECORD_VAR) {
            scope.push_dynamic(RECORD_VAR, to_dynamic(data)?);
        }
    }
    Ok(scope)
}

/// Count the tokens that add a level to the expression tree, outside string
/// and character literals. Left-leaning chains never trip the parser's depth
/// limit but still recurse once per operator when evaluated.
fn operator_count(expression: &str) -> usize {
    let mut count = 0;
    let mut quote = None;
    let mut escaped = false;
    for c in expression.chars() {
        match quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' | '`' => quote = Some(c),
                '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^' | '?'
                | '.' | '[' | '(' => count += 1,
                _ => {}
            },
        }
    }
    count
}
