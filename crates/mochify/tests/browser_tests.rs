//! Runs through a real Chromium page.
//!
//! The page gets a minimal `Mocha` stand-in so the injected agent script,
//! its encoder and its queue execute for real. Requires the `browser`
//! feature and a local Chromium:
//!
//! ```bash
//! cargo test -p mochify --features browser --test browser_tests -- --ignored
//! ```

#![cfg(feature = "browser")]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use mochify::inspect::{format_console, InspectOptions};
use mochify::prelude::*;
use mochify::shadow::Shadow;
use std::sync::{Arc, Mutex};

/// Just enough of mocha's global surface for the agent: runner constants,
/// `reporter`/`ui`/`timeout`, an `it` global and a synchronous `run`.
const MOCHA_SHIM: &str = r#"
(function () {
  var constants = {
    EVENT_RUN_BEGIN: 'start',
    EVENT_RUN_END: 'end',
    EVENT_SUITE_BEGIN: 'suite',
    EVENT_SUITE_END: 'suite end',
    EVENT_DELAY_BEGIN: 'waiting',
    EVENT_DELAY_END: 'ready',
    EVENT_TEST_PASS: 'pass',
    EVENT_TEST_PENDING: 'pending',
    EVENT_TEST_FAIL: 'fail',
    EVENT_TEST_END: 'test end'
  };

  function Runner() {
    this.listeners = {};
    this.stats = {};
  }
  Runner.constants = constants;
  Runner.prototype.on = function (event, fn) {
    (this.listeners[event] = this.listeners[event] || []).push(fn);
  };
  Runner.prototype.emit = function (event) {
    var args = Array.prototype.slice.call(arguments, 1);
    (this.listeners[event] || []).forEach(function (fn) {
      fn.apply(null, args);
    });
  };

  function Test(title, fn) {
    this.title = title;
    this.fn = fn;
    this.type = 'test';
  }
  Test.prototype.fullTitle = function () {
    return this.title;
  };
  Test.prototype.titlePath = function () {
    return [this.title];
  };

  var tests = [];
  var Reporter = null;
  var root = { root: true, title: '', pending: false, delayed: false };

  window.Mocha = { Runner: Runner };
  window.mocha = {
    suite: root,
    reporter: function (reporter) {
      Reporter = reporter;
    },
    ui: function () {
      window.it = function (title, fn) {
        tests.push(new Test(title, fn));
      };
    },
    timeout: function () {},
    run: function (done) {
      var runner = new Runner();
      new Reporter(runner);
      runner.stats.start = new Date();
      runner.emit('start');
      runner.emit('suite', root);
      var failures = 0;
      tests.forEach(function (test) {
        try {
          test.fn();
          test.state = 'passed';
          runner.emit('pass', test);
        } catch (err) {
          failures++;
          test.state = 'failed';
          runner.emit('fail', test, err);
        }
        test.duration = 0;
        runner.emit('test end', test);
      });
      runner.emit('suite end', root);
      runner.stats.end = new Date();
      runner.stats.duration = runner.stats.end - runner.stats.start;
      runner.emit('end');
      done(failures);
    }
  };
})();
"#;

const BUNDLE: &str = r#"
console.log(undefined, NaN, 42, 1n, Symbol('x'), Infinity, -Infinity);

var o = { a: {} };
o.a.back = o;
console.log(o);

it('logs a pending promise', function () {
  console.log(new Promise(function () {}));
});

it('fails', function () {
  throw new TypeError('Oh noes!');
});
"#;

/// Reporter and console writing into one shared, ordered log
#[derive(Debug, Clone, Default)]
struct Timeline(Arc<Mutex<Vec<String>>>);

impl Timeline {
    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry:?} missing from {:?}", self.entries()))
    }
}

impl Reporter for Timeline {
    fn on_event(&mut self, event: &RunnerEvent, _stats: &Stats) -> MochifyResult<()> {
        let line = match event {
            RunnerEvent::TestFail(test, Shadow::Error(err)) => {
                format!("event:fail:{}:{}", test.full_title(), err.summary())
            }
            other => format!("event:{}", other.name()),
        };
        self.0.lock().unwrap().push(line);
        Ok(())
    }
}

impl HostConsole for Timeline {
    fn write(&mut self, level: ConsoleLevel, args: &[Shadow]) -> MochifyResult<()> {
        let line = format_console(args, &InspectOptions::default());
        self.0
            .lock()
            .unwrap()
            .push(format!("console.{}:{line}", level.name()));
        Ok(())
    }
}

#[tokio::test]
#[ignore = "needs chromium"]
async fn test_agent_script_in_chromium() {
    let config = BrowserConfig::default().with_no_sandbox();
    let mut driver = ChromiumDriver::launch(config)
        .await
        .expect("chromium should launch");

    let timeline = Timeline::default();
    let mut runner = Runner::new(timeline.clone());
    let mut console = timeline.clone();
    let options = RunOptions::default()
        .with_framework_script(MOCHA_SHIM)
        .with_coverage(Arc::new(CoverageSlot::new()));

    let code = run(&mut driver, &mut runner, &mut console, BUNDLE, &options).await;
    driver.end().await.unwrap();
    assert_eq!(code.unwrap(), 1);

    // Primitives
    timeline.position("console.log:undefined NaN 42 1n Symbol(x) Infinity -Infinity");
    // Cycle
    timeline.position("console.log:{ a: { back: '[Circular *]' } }");
    // A payload still encoding holds back the events queued after it
    let log = timeline.position("console.log:Promise { <pending> }");
    let test_end = timeline.position("event:test end");
    assert!(log < test_end, "{:?}", timeline.entries());

    timeline.position("event:fail:fails:TypeError: Oh noes!");
    assert_eq!(runner.stats().failures, 1);
    assert_eq!(runner.stats().passes, 1);
}
