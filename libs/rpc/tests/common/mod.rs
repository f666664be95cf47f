#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use courier_rpc::{MethodTable, Service, Value};
use serde::{Deserialize, Serialize};

pub const USER_SERVICE: &str = "UserService";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
}

impl User {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Stands for an interface with two implementations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Account {
    Person(User),
    Robot { serial: u32 },
}

#[derive(Default)]
pub struct UserServiceImpl {
    calls: AtomicUsize,
}

impl UserServiceImpl {
    pub fn get_user(&self, user: User) -> Result<User, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(user)
    }

    pub fn get_user_by_id(&self, id: u64) -> Result<User, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(User {
            name: format!("user-{id}"),
        })
    }

    pub fn rename(&self, user: User, name: String) -> Result<User, String> {
        Ok(User { name, ..user })
    }

    pub fn promote(&self, account: Account) -> Result<Account, String> {
        match account {
            Account::Robot { serial } => Ok(Account::Person(User {
                name: format!("robot-{serial}"),
            })),
            person => Ok(person),
        }
    }

    pub fn reject(&self, user: User) -> Result<User, String> {
        Err(format!("{} is banned", user.name))
    }

    /// Hands back whatever it was given, concrete type included
    pub fn echo(&self, value: Value) -> Result<Value, String> {
        Ok(value)
    }

    pub fn touch(&self) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    pub fn explode(&self) -> Result<(), String> {
        panic!("kaboom")
    }

    pub fn call_count(&self) -> Result<usize, String> {
        Ok(self.calls.load(Ordering::SeqCst))
    }
}

impl Service for UserServiceImpl {
    fn methods(table: &mut MethodTable<Self>) {
        table
            .method("getUser", UserServiceImpl::get_user)
            .method("getUser", UserServiceImpl::get_user_by_id)
            .method("rename", UserServiceImpl::rename)
            .method("promote", UserServiceImpl::promote)
            .method("reject", UserServiceImpl::reject)
            .method("echo", UserServiceImpl::echo)
            .method("touch", UserServiceImpl::touch)
            .method("explode", UserServiceImpl::explode)
            .method("callCount", UserServiceImpl::call_count);
    }
}
