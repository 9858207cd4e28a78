//! Streaming tree writers.
//!
//! Every `begin_*` must be closed by the matching `end_*`; a mismatched close,
//! a value without a name inside an object, or a second root value fails with
//! [`Error::UnbalancedContainerClose`].

use std::io::Write;

use crate::error::Error;

pub trait TreeWriter {
    fn begin_object(&mut self) -> Result<(), Error>;
    fn end_object(&mut self) -> Result<(), Error>;
    fn begin_array(&mut self) -> Result<(), Error>;
    fn end_array(&mut self) -> Result<(), Error>;
    /// Names the next value inside an object.
    fn name(&mut self, name: &str) -> Result<(), Error>;
    fn value(&mut self, value: &str) -> Result<(), Error>;
    /// Number of open containers.
    fn depth(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Object,
    Array,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    count: usize,
    pending_name: bool,
}

/// Tracks container nesting and checks begin/end discipline.
#[derive(Debug, Default)]
struct Discipline {
    scopes: Vec<Scope>,
    done: bool,
}

impl Discipline {
    /// Validates a value position. Returns the sibling index inside an array.
    fn before_value(&mut self) -> Result<Option<usize>, Error> {
        match self.scopes.last_mut() {
            None if self.done => Err(Error::UnbalancedContainerClose(
                "a second root value".to_string(),
            )),
            None => Ok(None),
            Some(scope) if scope.kind == ScopeKind::Object => {
                if !scope.pending_name {
                    return Err(Error::UnbalancedContainerClose(
                        "value inside an object without a name".to_string(),
                    ));
                }
                scope.pending_name = false;
                Ok(None)
            }
            Some(scope) => {
                scope.count += 1;
                Ok(Some(scope.count - 1))
            }
        }
    }

    fn after_value(&mut self) {
        if self.scopes.is_empty() {
            self.done = true;
        }
    }

    fn open(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope {
            kind,
            count: 0,
            pending_name: false,
        });
    }

    /// Pops the matching scope and returns how many children it held.
    fn close(&mut self, kind: ScopeKind) -> Result<usize, Error> {
        match self.scopes.last().map(|s| (s.kind, s.pending_name, s.count)) {
            Some((open, false, count)) if open == kind => {
                self.scopes.pop();
                self.after_value();
                Ok(count)
            }
            Some((_, true, _)) => Err(Error::UnbalancedContainerClose(format!(
                "closing {:?} after a name with no value",
                kind
            ))),
            Some((open, _, _)) => Err(Error::UnbalancedContainerClose(format!(
                "closing {:?} while {:?} is open",
                kind, open
            ))),
            None => Err(Error::UnbalancedContainerClose(format!(
                "closing {:?} with nothing open",
                kind
            ))),
        }
    }

    /// Returns the member index for a new name.
    fn name(&mut self) -> Result<usize, Error> {
        match self.scopes.last_mut() {
            Some(scope) if scope.kind == ScopeKind::Object && !scope.pending_name => {
                scope.pending_name = true;
                scope.count += 1;
                Ok(scope.count - 1)
            }
            Some(scope) if scope.kind == ScopeKind::Object => Err(Error::UnbalancedContainerClose(
                "two names in a row".to_string(),
            )),
            _ => Err(Error::UnbalancedContainerClose(
                "name outside of an object".to_string(),
            )),
        }
    }
}

/// Pretty-printing JSON writer with a two-space indent.
pub struct JsonTreeWriter<W: Write> {
    out: W,
    state: Discipline,
}

impl<W: Write> JsonTreeWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: Discipline::default(),
        }
    }

    fn newline(&mut self, depth: usize) -> Result<(), Error> {
        self.out.write_all(b"\n")?;
        for _ in 0..depth {
            self.out.write_all(b"  ")?;
        }
        Ok(())
    }

    fn start_value(&mut self) -> Result<(), Error> {
        if let Some(index) = self.state.before_value()? {
            if index > 0 {
                self.out.write_all(b",")?;
            }
            self.newline(self.state.scopes.len())?;
        }
        Ok(())
    }

    fn close(&mut self, kind: ScopeKind, token: &[u8]) -> Result<(), Error> {
        let count = self.state.close(kind)?;
        if count > 0 {
            self.newline(self.state.scopes.len())?;
        }
        self.out.write_all(token)?;
        Ok(())
    }

    /// Checks that everything was closed and hands back the sink.
    pub fn finish(mut self) -> Result<W, Error> {
        if let Some(scope) = self.state.scopes.last() {
            return Err(Error::UnbalancedContainerClose(format!(
                "{} container(s) still open, innermost {:?}",
                self.state.scopes.len(),
                scope.kind
            )));
        }
        if self.state.done {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> TreeWriter for JsonTreeWriter<W> {
    fn begin_object(&mut self) -> Result<(), Error> {
        self.start_value()?;
        self.out.write_all(b"{")?;
        self.state.open(ScopeKind::Object);
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), Error> {
        self.close(ScopeKind::Object, b"}")
    }

    fn begin_array(&mut self) -> Result<(), Error> {
        self.start_value()?;
        self.out.write_all(b"[")?;
        self.state.open(ScopeKind::Array);
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), Error> {
        self.close(ScopeKind::Array, b"]")
    }

    fn name(&mut self, name: &str) -> Result<(), Error> {
        let index = self.state.name()?;
        if index > 0 {
            self.out.write_all(b",")?;
        }
        self.newline(self.state.scopes.len())?;
        serde_json::to_writer(&mut self.out, name)?;
        self.out.write_all(b": ")?;
        Ok(())
    }

    fn value(&mut self, value: &str) -> Result<(), Error> {
        self.start_value()?;
        serde_json::to_writer(&mut self.out, value)?;
        self.state.after_value();
        Ok(())
    }

    fn depth(&self) -> usize {
        self.state.scopes.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterEvent {
    BeginObject,
    EndObject,
    BeginArray,
    EndArray,
    Name(String),
    Value(String),
}

/// Writer that records calls instead of producing text.
#[derive(Debug, Default)]
pub struct EventRecorder {
    pub events: Vec<WriterEvent>,
    state: Discipline,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, event: &WriterEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn is_closed(&self) -> bool {
        self.state.scopes.is_empty()
    }
}

impl TreeWriter for EventRecorder {
    fn begin_object(&mut self) -> Result<(), Error> {
        self.state.before_value()?;
        self.state.open(ScopeKind::Object);
        self.events.push(WriterEvent::BeginObject);
        Ok(())
    }

    fn end_object(&mut self) -> Result<(), Error> {
        self.state.close(ScopeKind::Object)?;
        self.events.push(WriterEvent::EndObject);
        Ok(())
    }

    fn begin_array(&mut self) -> Result<(), Error> {
        self.state.before_value()?;
        self.state.open(ScopeKind::Array);
        self.events.push(WriterEvent::BeginArray);
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), Error> {
        self.state.close(ScopeKind::Array)?;
        self.events.push(WriterEvent::EndArray);
        Ok(())
    }

    fn name(&mut self, name: &str) -> Result<(), Error> {
        self.state.name()?;
        self.events.push(WriterEvent::Name(name.to_string()));
        Ok(())
    }

    fn value(&mut self, value: &str) -> Result<(), Error> {
        self.state.before_value()?;
        self.state.after_value();
        self.events.push(WriterEvent::Value(value.to_string()));
        Ok(())
    }

    fn depth(&self) -> usize {
        self.state.scopes.len()
    }
}
