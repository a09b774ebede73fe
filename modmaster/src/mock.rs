//! Scripted byte stream used by the unit tests

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::stream::ByteStream;

#[derive(Clone, Debug)]
pub(crate) enum Action {
    /// the next write must be exactly these bytes
    ExpectWrite(Vec<u8>),
    /// bytes returned by reads, possibly across several calls
    Read(Vec<u8>),
    /// the next read fails
    ReadError(ErrorKind),
    /// the next write fails
    WriteError(ErrorKind),
}

#[derive(Default)]
struct State {
    actions: VecDeque<Action>,
    writes: Vec<Vec<u8>>,
    reads: usize,
    discards: usize,
}

/// reads pop scripted actions, an empty script times out
pub(crate) struct MockStream {
    state: Arc<Mutex<State>>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

/// inspects a [`MockStream`] after it was moved into a master
#[derive(Clone)]
pub(crate) struct MockHandle {
    state: Arc<Mutex<State>>,
}

impl MockStream {
    pub(crate) fn new<I: IntoIterator<Item = Action>>(actions: I) -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(State {
            actions: actions.into_iter().collect(),
            ..State::default()
        }));
        let stream = Self {
            state: state.clone(),
            read_timeout: None,
            write_timeout: None,
        };
        (stream, MockHandle { state })
    }
}

impl MockHandle {
    /// every write made so far, scripted or not
    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().writes.clone()
    }

    pub(crate) fn num_writes(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }

    /// number of scripted `Read` actions consumed completely
    pub(crate) fn num_reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub(crate) fn num_discards(&self) -> usize {
        self.state.lock().unwrap().discards
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state.lock().unwrap().actions.is_empty()
    }
}

impl ByteStream for MockStream {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        match state.actions.pop_front() {
            Some(Action::Read(bytes)) => {
                let count = bytes.len().min(buffer.len());
                buffer[..count].copy_from_slice(&bytes[..count]);
                if count < bytes.len() {
                    state.actions.push_front(Action::Read(bytes[count..].to_vec()));
                } else {
                    state.reads += 1;
                }
                Ok(count)
            }
            Some(Action::ReadError(kind)) => Err(kind.into()),
            Some(action) => panic!("read while the next scripted action is {action:?}"),
            None => Err(ErrorKind::TimedOut.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.writes.push(data.to_vec());
        match state.actions.pop_front() {
            Some(Action::ExpectWrite(expected)) => {
                assert_eq!(data, expected.as_slice(), "unexpected write");
                Ok(())
            }
            Some(Action::WriteError(kind)) => Err(kind.into()),
            Some(action) => {
                state.actions.push_front(action);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn read_timeout(&self) -> std::io::Result<Option<Duration>> {
        Ok(self.read_timeout)
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.read_timeout = timeout;
        Ok(())
    }

    fn write_timeout(&self) -> std::io::Result<Option<Duration>> {
        Ok(self.write_timeout)
    }

    fn set_write_timeout(&mut self, timeout: Option<Duration>) -> std::io::Result<()> {
        self.write_timeout = timeout;
        Ok(())
    }

    fn discard_in_buffer(&mut self) -> std::io::Result<()> {
        self.state.lock().unwrap().discards += 1;
        Ok(())
    }
}
