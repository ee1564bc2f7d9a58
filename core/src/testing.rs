//! Recording connection used by unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::ops::Deref;
use std::rc::Rc;

use crate::attributes::AttributeMap;
use crate::connection::{Connection, ExecOutcome, RowSet, Statement};
use crate::error::DriverError;
use crate::value::{BindType, Value};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Query(String),
    Execute {
        sql: String,
        types: Vec<BindType>,
        values: Vec<Value>,
    },
}

#[derive(Debug)]
pub(crate) struct MockState {
    tables: RefCell<HashMap<String, Vec<String>>>,
    responses: RefCell<HashMap<String, Vec<AttributeMap>>>,
    calls: RefCell<Vec<Call>>,
    describe_calls: Cell<usize>,
    selected: RefCell<Option<String>>,
    refuse_databases: Cell<bool>,
    next_key: Cell<i64>,
    fail_prepare: RefCell<Option<String>>,
    fail_execute: RefCell<Option<String>>,
}

impl MockState {
    /// Scripts the rows returned for an exact SQL string.
    pub(crate) fn respond(&self, sql: &str, rows: Vec<AttributeMap>) {
        self.responses.borrow_mut().insert(sql.to_string(), rows);
    }

    pub(crate) fn fail_execute_on(&self, needle: &str) {
        *self.fail_execute.borrow_mut() = Some(needle.to_string());
    }

    pub(crate) fn fail_prepare_on(&self, needle: &str) {
        *self.fail_prepare.borrow_mut() = Some(needle.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Query(sql) => Some(sql.clone()),
                Call::Execute { .. } => None,
            })
            .collect()
    }

    pub(crate) fn executed(&self) -> Vec<(String, Vec<BindType>, Vec<Value>)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Execute { sql, types, values } => {
                    Some((sql.clone(), types.clone(), values.clone()))
                }
                Call::Query(_) => None,
            })
            .collect()
    }

    pub(crate) fn describe_calls(&self) -> usize {
        self.describe_calls.get()
    }

    pub(crate) fn selected_database(&self) -> Option<String> {
        self.selected.borrow().clone()
    }

    fn matches(slot: &RefCell<Option<String>>, sql: &str) -> bool {
        slot.borrow().as_deref().is_some_and(|needle| sql.contains(needle))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct MockConnection {
    state: Rc<MockState>,
}

impl MockConnection {
    pub(crate) fn new() -> Self {
        Self {
            state: Rc::new(MockState {
                tables: RefCell::new(HashMap::new()),
                responses: RefCell::new(HashMap::new()),
                calls: RefCell::new(Vec::new()),
                describe_calls: Cell::new(0),
                selected: RefCell::new(None),
                refuse_databases: Cell::new(false),
                next_key: Cell::new(1),
                fail_prepare: RefCell::new(None),
                fail_execute: RefCell::new(None),
            }),
        }
    }

    pub(crate) fn with_table(self, table: &str, columns: &[&str]) -> Self {
        self.state.tables.borrow_mut().insert(
            table.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub(crate) fn with_next_key(self, key: i64) -> Self {
        self.state.next_key.set(key);
        self
    }

    pub(crate) fn refuse_databases(self) -> Self {
        self.state.refuse_databases.set(true);
        self
    }

    /// Shared handle that outlives the connection being moved into a session.
    pub(crate) fn log(&self) -> Rc<MockState> {
        Rc::clone(&self.state)
    }
}

impl Deref for MockConnection {
    type Target = MockState;

    fn deref(&self) -> &MockState {
        &self.state
    }
}

impl Connection for MockConnection {
    fn select_database(&self, name: &str) -> Result<(), DriverError> {
        if self.state.refuse_databases.get() {
            return Err(format!("unknown database '{name}'").into());
        }
        *self.state.selected.borrow_mut() = Some(name.to_string());
        Ok(())
    }

    fn query(&self, sql: &str) -> Result<Box<dyn RowSet + '_>, DriverError> {
        self.state.calls.borrow_mut().push(Call::Query(sql.to_string()));
        if MockState::matches(&self.state.fail_execute, sql) {
            return Err("syntax error".into());
        }
        let rows = self
            .state
            .responses
            .borrow()
            .get(sql)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(MockRows(rows.into())))
    }

    fn prepare(&self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError> {
        if MockState::matches(&self.state.fail_prepare, sql) {
            return Err("no such column".into());
        }
        Ok(Box::new(MockStatement {
            state: Rc::clone(&self.state),
            sql: sql.to_string(),
            types: Vec::new(),
            values: Vec::new(),
        }))
    }

    fn describe(&self, _database: &str, table: &str) -> Result<Vec<String>, DriverError> {
        self.state.describe_calls.set(self.state.describe_calls.get() + 1);
        self.state
            .tables
            .borrow()
            .get(table)
            .cloned()
            .ok_or_else(|| format!("no such table: {table}").into())
    }
}

struct MockStatement {
    state: Rc<MockState>,
    sql: String,
    types: Vec<BindType>,
    values: Vec<Value>,
}

impl Statement for MockStatement {
    fn bind_typed(&mut self, types: &[BindType], values: &[Value]) -> Result<(), DriverError> {
        self.types = types.to_vec();
        self.values = values.to_vec();
        Ok(())
    }

    fn execute(&mut self) -> Result<ExecOutcome, DriverError> {
        if MockState::matches(&self.state.fail_execute, &self.sql) {
            return Err("constraint failed".into());
        }
        self.state.calls.borrow_mut().push(Call::Execute {
            sql: self.sql.clone(),
            types: self.types.clone(),
            values: self.values.clone(),
        });

        let generated_key = self.sql.starts_with("INSERT").then(|| {
            let key = self.state.next_key.get();
            self.state.next_key.set(key + 1);
            key
        });
        Ok(ExecOutcome {
            affected_rows: 1,
            generated_key,
        })
    }
}

struct MockRows(VecDeque<AttributeMap>);

impl RowSet for MockRows {
    fn next_row(&mut self) -> Result<Option<AttributeMap>, DriverError> {
        Ok(self.0.pop_front())
    }
}
