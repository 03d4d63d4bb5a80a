//! Stand-ins for the applet table and the OS, recording what
//! they were asked to do.

use crate::Applets;
use crate::ProcessImage;

use rustix::io::Errno;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::ffi::OsString;
use std::io;

/// `true` (noexec), `which` (needs exec), `false` (noexec).
#[ derive( Debug, Default ) ]
pub struct Table {
    pub runs: RefCell<Vec<( usize, Vec<OsString> )>>,
}

const TABLE: [ ( &str, bool, i32 ); 3 ] = [
    ( "true", true, 0 ),
    ( "which", false, 0 ),
    ( "false", true, 1 ),
];

impl Applets for Table {
    type Handle = usize;

    fn find( &self, name: &OsStr ) -> Option<usize> {
        TABLE.iter().position( |( it, _, _ )| name == *it )
    }

    fn is_noexec( &self, handle: usize ) -> bool {
        TABLE.get( handle ).is_some_and( |it| it.1 )
    }

    fn run( &self, handle: usize, _: &OsStr, argv: &[OsString] ) -> i32 {
        self.runs.borrow_mut().push( ( handle, argv.to_vec() ) );
        TABLE.get( handle ).map_or( -1, |it| it.2 )
    }
}

#[ derive( Debug, Clone, PartialEq, Eq ) ]
pub enum Event {
    Exec { program: OsString, argv: Vec<OsString> },
    Env( Vec<OsString> ),
}

/// Every exec "fails" with the next queued errno, `ENOENT` once
/// the queue runs dry.
#[ derive( Debug, Default ) ]
pub struct Recorder {
    pub events: Vec<Event>,
    errors: VecDeque<Errno>,
}

impl Recorder {
    pub fn failing( errors: impl IntoIterator<Item = Errno> ) -> Self {
        Self { events: vec![], errors: errors.into_iter().collect() }
    }
}

impl ProcessImage for Recorder {
    fn exec( &mut self, program: &OsStr, argv: &[OsString] ) -> io::Error {
        self.events.push( Event::Exec {
            program: program.to_owned(),
            argv: argv.to_vec(),
        } );
        let errno = self.errors.pop_front().unwrap_or( Errno::NOENT );
        io::Error::from_raw_os_error( errno.raw_os_error() )
    }

    fn replace_env( &mut self, entries: &[OsString] ) {
        self.events.push( Event::Env( entries.to_vec() ) );
    }
}
