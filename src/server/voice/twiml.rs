//! TwiML instruction tree and XML rendering
//!
//! The vocabulary is exactly what the router needs: bridge with `<Dial>` to a
//! `<Client>` or a `<Number>`, speak with `<Say>`, and `<Hangup/>`.

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;

/// Content type the provider expects on every voice webhook reply
pub const TWIML_CONTENT_TYPE: &str = "text/xml";

#[derive(Error, Debug)]
pub enum TwimlError {
    #[error("XML write error: {0}")]
    Write(String),
    #[error("Invalid instruction: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialTarget {
    /// A registered software endpoint, by identity
    Client(String),
    /// A PSTN address, passed through verbatim
    Number(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dial {
    pub target: DialTarget,
    pub caller_id: Option<String>,
    /// Ring timeout in seconds
    pub timeout: Option<u64>,
    pub action: Option<String>,
}

impl Dial {
    pub fn new(target: DialTarget) -> Self {
        Self {
            target,
            caller_id: None,
            timeout: None,
            action: None,
        }
    }

    pub fn caller_id(mut self, caller_id: Option<String>) -> Self {
        self.caller_id = caller_id;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn action(mut self, action: Option<String>) -> Self {
        self.action = action;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Dial(Dial),
    Say(String),
    Hangup,
}

/// A `<Response>` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dial(mut self, dial: Dial) -> Self {
        self.verbs.push(Verb::Dial(dial));
        self
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.verbs.push(Verb::Say(text.into()));
        self
    }

    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }
}

/// Render a response as a complete XML document
pub fn render(response: &VoiceResponse) -> Result<String, TwimlError> {
    let mut writer = Writer::new(Vec::new());
    write_response(&mut writer, response)?;
    String::from_utf8(writer.into_inner()).map_err(|e| TwimlError::Write(e.to_string()))
}

/// Stream a response into any writer
pub fn write_response<W: Write>(
    writer: &mut Writer<W>,
    response: &VoiceResponse,
) -> Result<(), TwimlError> {
    write(writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write(writer, Event::Start(BytesStart::new("Response")))?;

    for verb in &response.verbs {
        match verb {
            Verb::Dial(dial) => write_dial(writer, dial)?,
            Verb::Say(text) => {
                write(writer, Event::Start(BytesStart::new("Say")))?;
                write(writer, Event::Text(BytesText::new(text)))?;
                write(writer, Event::End(BytesEnd::new("Say")))?;
            }
            Verb::Hangup => write(writer, Event::Empty(BytesStart::new("Hangup")))?,
        }
    }

    write(writer, Event::End(BytesEnd::new("Response")))
}

fn write_dial<W: Write>(writer: &mut Writer<W>, dial: &Dial) -> Result<(), TwimlError> {
    let (noun, address) = match &dial.target {
        DialTarget::Client(identity) => ("Client", identity),
        DialTarget::Number(number) => ("Number", number),
    };
    if address.is_empty() {
        return Err(TwimlError::Invalid("dial target is empty"));
    }

    let mut start = BytesStart::new("Dial");
    if let Some(caller_id) = &dial.caller_id {
        start.push_attribute(("callerId", caller_id.as_str()));
    }
    if let Some(timeout) = dial.timeout {
        start.push_attribute(("timeout", timeout.to_string().as_str()));
    }
    if let Some(action) = &dial.action {
        start.push_attribute(("action", action.as_str()));
        start.push_attribute(("method", "POST"));
    }

    write(writer, Event::Start(start))?;
    write(writer, Event::Start(BytesStart::new(noun)))?;
    write(writer, Event::Text(BytesText::new(address)))?;
    write(writer, Event::End(BytesEnd::new(noun)))?;
    write(writer, Event::End(BytesEnd::new("Dial")))
}

fn write<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), TwimlError> {
    writer
        .write_event(event)
        .map_err(|e| TwimlError::Write(e.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use quick_xml::Reader;
    use std::io;

    /// Element names and text content, in document order
    pub(crate) fn parse(xml: &str) -> (Vec<String>, Vec<String>) {
        let mut reader = Reader::from_str(xml);
        let mut names = Vec::new();
        let mut texts = Vec::new();
        loop {
            match reader.read_event().expect("well-formed TwiML") {
                Event::Start(e) | Event::Empty(e) => {
                    names.push(String::from_utf8_lossy(e.name().as_ref()).into_owned())
                }
                Event::Text(t) => texts.push(t.unescape().expect("valid text").into_owned()),
                Event::Eof => break,
                _ => {}
            }
        }
        (names, texts)
    }

    struct ClosedPipe;

    impl io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_say_and_hangup() {
        let xml = render(&VoiceResponse::new().say("Goodbye").hangup()).unwrap();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><Response><Say>Goodbye</Say><Hangup/></Response>"#
        );
    }

    #[test]
    fn test_dial_with_all_attributes() {
        let dial = Dial::new(DialTarget::Client("browser-client".to_string()))
            .caller_id(Some("+15551230000".to_string()))
            .timeout(30)
            .action(Some("https://example.com/api/voice/status".to_string()));
        let xml = render(&VoiceResponse::new().dial(dial)).unwrap();

        assert!(xml.contains(
            r#"<Dial callerId="+15551230000" timeout="30" action="https://example.com/api/voice/status" method="POST"><Client>browser-client</Client></Dial>"#
        ));
    }

    #[test]
    fn test_text_and_attributes_are_escaped() {
        let dial = Dial::new(DialTarget::Number("<1>&2".to_string()))
            .caller_id(Some("\"x\"".to_string()));
        let xml = render(&VoiceResponse::new().dial(dial)).unwrap();

        assert!(!xml.contains("<1>"));
        let (names, texts) = parse(&xml);
        assert_eq!(names, vec!["Response", "Dial", "Number"]);
        assert_eq!(texts, vec!["<1>&2"]);
    }

    #[test]
    fn test_empty_dial_target_is_rejected() {
        let response = VoiceResponse::new().dial(Dial::new(DialTarget::Client(String::new())));
        assert!(matches!(render(&response), Err(TwimlError::Invalid(_))));
    }

    #[test]
    fn test_writer_failure_surfaces_as_error() {
        let mut writer = Writer::new(ClosedPipe);
        let result = write_response(&mut writer, &VoiceResponse::new().hangup());
        assert!(matches!(result, Err(TwimlError::Write(_))));
    }
}
