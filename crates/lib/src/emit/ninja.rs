//! Low-level Ninja syntax writer.

use crate::plugin::Rule;

use super::EmitError;

/// Escape a path for use in a `build` line.
pub fn escape_path(path: &str) -> Result<String, EmitError> {
  if path.contains('\n') {
    return Err(EmitError::InvalidPath(path.to_string()));
  }
  let mut escaped = String::with_capacity(path.len());
  for c in path.chars() {
    match c {
      '$' => escaped.push_str("$$"),
      ' ' => escaped.push_str("$ "),
      ':' => escaped.push_str("$:"),
      c => escaped.push(c),
    }
  }
  Ok(escaped)
}

fn escape_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Result<Vec<String>, EmitError> {
  paths.into_iter().map(escape_path).collect()
}

/// Escape a variable value. Only `$` is special on the right of `=`.
pub fn escape_value(key: &str, value: &str) -> Result<String, EmitError> {
  if value.contains('\n') {
    return Err(EmitError::InvalidValue { key: key.to_string() });
  }
  Ok(value.replace('$', "$$"))
}

/// Quote an argument for the POSIX shell Ninja runs commands through.
pub fn shell_quote(arg: &str) -> String {
  let safe = !arg.is_empty()
    && arg
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "_./:@%+=,-".contains(c));
  if safe {
    arg.to_string()
  } else {
    format!("'{}'", arg.replace('\'', r"'\''"))
  }
}

/// Accumulates a build file in memory.
#[derive(Debug, Default)]
pub struct NinjaWriter {
  out: String,
}

impl NinjaWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn comment(&mut self, text: &str) {
    for line in text.lines() {
      self.out.push_str("# ");
      self.out.push_str(line);
      self.out.push('\n');
    }
  }

  pub fn newline(&mut self) {
    self.out.push('\n');
  }

  /// Top-level or indented `key = value`. `value` is written as is.
  pub fn variable(&mut self, key: &str, value: &str, indent: bool) {
    if indent {
      self.out.push_str("  ");
    }
    self.out.push_str(key);
    self.out.push_str(" = ");
    self.out.push_str(value);
    self.out.push('\n');
  }

  /// A `rule` block. The command template is written unescaped so that it
  /// can reference `$in`, `$out`, and product variables.
  pub fn rule(&mut self, rule: &Rule) {
    self.out.push_str("rule ");
    self.out.push_str(&rule.name);
    self.out.push('\n');
    self.variable("command", &rule.command, true);
    if let Some(description) = &rule.description {
      self.variable("description", description, true);
    }
    if let Some(depfile) = &rule.depfile {
      self.variable("depfile", depfile, true);
    }
    if let Some(deps) = &rule.deps {
      self.variable("deps", deps, true);
    }
    if rule.generator {
      self.variable("generator", "1", true);
    }
    self.newline();
  }

  /// A `build` edge.
  pub fn build<'a>(
    &mut self,
    outputs: impl IntoIterator<Item = &'a str>,
    rule: &str,
    inputs: impl IntoIterator<Item = &'a str>,
    implicit: impl IntoIterator<Item = &'a str>,
    variables: impl IntoIterator<Item = (&'a str, &'a str)>,
  ) -> Result<(), EmitError> {
    let outputs = escape_paths(outputs)?;
    let inputs = escape_paths(inputs)?;
    let implicit = escape_paths(implicit)?;

    self.out.push_str("build ");
    self.out.push_str(&outputs.join(" "));
    self.out.push_str(": ");
    self.out.push_str(rule);
    for input in &inputs {
      self.out.push(' ');
      self.out.push_str(input);
    }
    if !implicit.is_empty() {
      self.out.push_str(" |");
      for input in &implicit {
        self.out.push(' ');
        self.out.push_str(input);
      }
    }
    self.out.push('\n');

    for (key, value) in variables {
      let value = escape_value(key, value)?;
      self.variable(key, &value, true);
    }
    Ok(())
  }

  pub fn finish(self) -> String {
    self.out
  }
}
