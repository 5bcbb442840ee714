use std::io;
use std::sync::{Arc, Mutex};

use nova_decomp_ir::{to_source_text, DecompileContext, Exprent, InvocationExprent};
use nova_decomp_types::ClassStore;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct SharedLogBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedLogBuffer {
    fn as_string(&self) -> String {
        let bytes = self.0.lock().expect("log buffer mutex poisoned");
        String::from_utf8_lossy(&bytes).to_string()
    }
}

struct SharedLogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut out = self.0.lock().expect("log buffer mutex poisoned");
        out.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(self.0.clone())
    }
}

#[test]
fn malformed_descriptors_are_logged_and_tolerated() {
    let logs = SharedLogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::WARN)
        .with_writer(logs.clone())
        .finish();

    let text = tracing::subscriber::with_default(subscriber, || {
        let store = ClassStore::new();
        let ctx = DecompileContext::new(&store, "app/Main");
        let call = Exprent::new(InvocationExprent::static_call("app/Util", "run", "not-a-descriptor", Vec::new()));
        to_source_text(&call, &ctx, 0).expect("renders").into_string()
    });

    assert_eq!(text, "Util.run()");
    let log = logs.as_string();
    assert!(log.contains("bad method descriptor"), "expected a descriptor warning, got:\n{log}");
}
