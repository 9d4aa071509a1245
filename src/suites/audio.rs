//! Audio suite: audio mode validation and the sound object lifecycle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::SuiteContext;
use crate::capabilities::audio::{
    AudioMode, AudioSession, InterruptionModeAndroid, InterruptionModeIos, PlaybackStatusUpdate,
    Sound, SoundSource, BUNDLED_ASSET, REMOTE_SOUND_URI,
};
use crate::harness::{expect, expect_err, fail, Fixture, SuiteBuilder, TestFailure, TestResult};
use crate::poller::{retry_for_status, wait_for, PollConfig, StatusShape};

/// What the rate teardown should attempt and expect
#[derive(Debug, Clone, Copy, Default)]
struct RateCase {
    rate: f64,
    should_error: bool,
    should_correct_pitch: bool,
}

fn lizard() -> SoundSource {
    SoundSource::asset(BUNDLED_ASSET)
}

fn loaded() -> StatusShape {
    StatusShape::new().field("isLoaded", true)
}

fn playing(is_playing: bool) -> StatusShape {
    StatusShape::new().field("isPlaying", is_playing)
}

async fn retry(sound: &Sound, expected: StatusShape, poll: &PollConfig) -> TestResult {
    retry_for_status(sound, &expected, poll).await?;
    Ok(())
}

fn initial_status() -> PlaybackStatusUpdate {
    PlaybackStatusUpdate::new()
        .should_play(true)
        .is_looping(true)
        .is_muted(false)
        .volume(0.5)
        .rate(1.5)
}

/// Register `body` with clones of the current sound and poll config
macro_rules! sound_test {
    ($suite:expr, $name:expr, $sound:expr, $poll:expr, |$s:ident, $p:ident| $body:block) => {{
        let sound = $sound.clone();
        let poll = $poll;
        $suite.it($name, move || {
            let sound = sound.clone();
            async move {
                let $s: Sound = sound.get().await?;
                let $p: PollConfig = poll;
                $body
            }
        });
    }};
}

pub fn register(root: &mut SuiteBuilder, context: &SuiteContext) {
    let session = context.audio.clone();
    let poll = context.poll;

    root.describe("Audio class", |suite| {
        let session = session.clone();
        suite.describe("Audio.setAudioModeAsync", move |suite| {
            suite.it("rejects an invalid promise", move || {
                let session = session.clone();
                async move {
                    let mode = AudioMode {
                        plays_in_silent_mode_ios: false,
                        allows_recording_ios: true,
                        interruption_mode_ios: InterruptionModeIos::DoNotMix,
                        should_duck_android: false,
                        interruption_mode_android: InterruptionModeAndroid::DoNotMix,
                    };
                    let error = expect_err(session.set_audio_mode(mode).await)?;
                    expect(error.to_string()).to_match("Impossible audio mode")
                }
            });
        });
    });

    root.describe("Audio instances", |suite| {
        let current: Fixture<Sound> = Fixture::new("sound");
        register_lifecycle_hooks(suite, &session, &current);

        suite.describe("Audio.loadAsync", |suite| {
            sound_test!(suite, "loads the file with `require`", current, poll, |sound, poll| {
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                retry(&sound, loaded(), &poll).await
            });

            sound_test!(suite, "loads the file from `Asset`", current, poll, |sound, poll| {
                sound.load(SoundSource::asset(BUNDLED_ASSET), PlaybackStatusUpdate::new()).await?;
                retry(&sound, loaded(), &poll).await
            });

            sound_test!(suite, "loads the file from the Internet", current, poll, |sound, poll| {
                sound.load(SoundSource::uri(REMOTE_SOUND_URI), PlaybackStatusUpdate::new()).await?;
                retry(&sound, loaded(), &poll).await
            });

            sound_test!(suite, "rejects if a file is already loaded", current, poll, |sound, poll| {
                sound.load(SoundSource::uri(REMOTE_SOUND_URI), PlaybackStatusUpdate::new()).await?;
                retry(&sound, loaded(), &poll).await?;

                let error = expect_err(sound.load(lizard(), PlaybackStatusUpdate::new()).await)?;
                expect(error.to_string()).to_match("already loaded")
            });
        });

        suite.describe("Audio.loadAsync(require, initialStatus)", |suite| {
            sound_test!(suite, "sets an initial status", current, poll, |sound, poll| {
                let options = initial_status();
                sound.load(lizard(), options.clone()).await?;
                retry(&sound, options.to_shape(), &poll).await
            });
        });

        suite.describe("Audio.setStatusAsync", |suite| {
            sound_test!(suite, "sets a status", current, poll, |sound, poll| {
                let options = initial_status();
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                sound.set_status(options.clone()).await?;
                retry(&sound, options.to_shape(), &poll).await
            });
        });

        suite.describe("Audio.unloadAsync(require, initialStatus)", |suite| {
            sound_test!(suite, "unloads the object when it is loaded", current, poll, |sound, poll| {
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                retry(&sound, loaded(), &poll).await?;
                sound.unload().await?;
                retry(&sound, StatusShape::new().field("isLoaded", false), &poll).await
            });

            sound_test!(suite, "rejects if the object isn't loaded", current, poll, |sound, _poll| {
                let rejected = sound.unload().await.is_err();
                expect(rejected).to_be(false)
            });
        });

        suite.describe("Audio.playAsync", |suite| {
            sound_test!(suite, "plays the sound", current, poll, |sound, poll| {
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                sound.play().await?;
                retry(&sound, playing(true), &poll).await
            });
        });

        suite.describe("Audio.replayAsync", |suite| {
            sound_test!(suite, "replays the sound", current, poll, |sound, poll| {
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                retry(&sound, loaded(), &poll).await?;
                sound.play().await?;
                retry(&sound, playing(true), &poll).await?;
                wait_for(Duration::from_millis(500)).await;

                let before = sound.status().await;
                sound.replay().await?;
                retry(&sound, playing(true), &poll).await?;
                let after = sound.status().await;

                match (before.loaded(), after.loaded()) {
                    (Some(before), Some(after)) => {
                        expect(after.position_millis).to_be_less_than(before.position_millis)
                    }
                    _ => fail("sound was unloaded during replay"),
                }
            });

            sound_test!(
                suite,
                "calls the onPlaybackStatusUpdate with hasJustBeenInterrupted = true",
                current,
                poll,
                |sound, poll| {
                    let interrupted = Arc::new(AtomicBool::new(false));
                    sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                    {
                        let interrupted = interrupted.clone();
                        sound
                            .set_on_playback_status_update(move |status| {
                                if status.loaded().is_some_and(|s| s.has_just_been_interrupted) {
                                    interrupted.store(true, Ordering::SeqCst);
                                }
                            })
                            .await;
                    }
                    retry(&sound, loaded(), &poll).await?;
                    sound.play().await?;
                    retry(&sound, playing(true), &poll).await?;
                    sound.replay().await?;

                    expect(interrupted.load(Ordering::SeqCst)).to_be(true)
                }
            );
        });

        suite.describe("Audio.pauseAsync", |suite| {
            sound_test!(suite, "pauses the sound", current, poll, |sound, poll| {
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                sound.play().await?;
                retry(&sound, playing(true), &poll).await?;
                sound.pause().await?;
                retry(&sound, playing(false), &poll).await?;
                sound.play().await?;
                retry(&sound, playing(true), &poll).await
            });
        });

        suite.describe("Audio.stopAsync", |suite| {
            sound_test!(suite, "stops the sound", current, poll, |sound, poll| {
                sound
                    .load(lizard(), PlaybackStatusUpdate::new().should_play(true))
                    .await?;
                retry(&sound, playing(true), &poll).await?;
                sound.stop().await?;
                retry(&sound, playing(false), &poll).await
            });
        });

        suite.describe("Audio.setPositionAsync", |suite| {
            sound_test!(suite, "sets the position", current, poll, |sound, poll| {
                sound.load(lizard(), PlaybackStatusUpdate::new()).await?;
                retry(&sound, StatusShape::new().field("positionMillis", 0), &poll).await?;
                sound.set_position(1000).await?;
                retry(&sound, StatusShape::new().field("positionMillis", 1000), &poll).await
            });
        });

        suite.describe("Audio.setVolumeAsync", |suite| {
            {
                let current = current.clone();
                suite.before_each(move || {
                    let current = current.clone();
                    async move {
                        let sound = current.get().await?;
                        sound
                            .load(lizard(), PlaybackStatusUpdate::new().volume(1.0))
                            .await?;
                        retry(&sound, StatusShape::new().field("volume", 1.0), &poll).await
                    }
                });
            }

            sound_test!(suite, "sets the volume", current, poll, |sound, poll| {
                sound.set_volume(0.5).await?;
                retry(&sound, StatusShape::new().field("volume", 0.5), &poll).await
            });

            for (description, value) in [("too big", 2.0), ("negative", -0.5)] {
                let current = current.clone();
                suite.it(
                    format!("rejects if volume value is {}", description),
                    move || {
                        let current = current.clone();
                        async move {
                            let sound = current.get().await?;
                            let error = expect_err(sound.set_volume(value).await)?;
                            expect(error.to_string()).to_match("value .+ between")
                        }
                    },
                );
            }
        });

        suite.describe("Audio.setIsMutedAsync", |suite| {
            sound_test!(suite, "sets whether the audio is muted", current, poll, |sound, poll| {
                sound
                    .load(lizard(), PlaybackStatusUpdate::new().is_muted(true))
                    .await?;
                retry(&sound, StatusShape::new().field("isMuted", true), &poll).await?;
                sound.set_is_muted(false).await?;
                retry(&sound, StatusShape::new().field("isMuted", false), &poll).await
            });
        });

        suite.describe("Audio.setIsLoopingAsync", |suite| {
            sound_test!(suite, "sets whether the audio is looped", current, poll, |sound, poll| {
                sound
                    .load(lizard(), PlaybackStatusUpdate::new().is_looping(false))
                    .await?;
                retry(&sound, StatusShape::new().field("isLooping", false), &poll).await?;
                sound.set_is_looping(true).await?;
                retry(&sound, StatusShape::new().field("isLooping", true), &poll).await
            });
        });

        suite.describe("Audio.setRateAsync", |suite| {
            register_rate_tests(suite, &current);
        });
    });
}

fn register_lifecycle_hooks(suite: &mut SuiteBuilder, session: &AudioSession, current: &Fixture<Sound>) {
    {
        let session = session.clone();
        suite.before_all(move || {
            let session = session.clone();
            async move {
                session.set_enabled(true).await?;
                Ok(())
            }
        });
    }
    {
        let session = session.clone();
        let current = current.clone();
        suite.before_each(move || {
            let session = session.clone();
            let current = current.clone();
            async move {
                current.set(session.create_sound()).await;
                Ok(())
            }
        });
    }
    {
        let current = current.clone();
        suite.after_each(move || {
            let current = current.clone();
            async move {
                if let Some(sound) = current.take().await {
                    sound.unload().await?;
                }
                Ok(())
            }
        });
    }
}

fn register_rate_tests(suite: &mut SuiteBuilder, current: &Fixture<Sound>) {
    let case: Fixture<RateCase> = Fixture::new("rate case");

    {
        let current = current.clone();
        suite.before_each(move || {
            let current = current.clone();
            async move {
                let rate = 0.9;
                let sound = current.get().await?;
                let status = sound
                    .load(lizard(), PlaybackStatusUpdate::new().rate(rate))
                    .await?;
                let actual = status
                    .loaded()
                    .map(|s| s.rate)
                    .ok_or_else(|| TestFailure::assertion("sound did not load"))?;
                expect(actual).to_be_close_to(rate, 2)
            }
        });
    }

    {
        let current = current.clone();
        let case = case.clone();
        suite.after_each(move || {
            let current = current.clone();
            let case = case.clone();
            async move {
                let RateCase {
                    rate,
                    should_error,
                    should_correct_pitch,
                } = case.take().await.unwrap_or_default();
                let sound = current.get().await?;

                let rejected = match sound.set_rate(rate, should_correct_pitch).await {
                    Ok(status) => {
                        if let Some(status) = status.loaded() {
                            expect(status.rate).to_be_close_to(rate, 2)?;
                            expect(status.should_correct_pitch).to_be(should_correct_pitch)?;
                        }
                        false
                    }
                    Err(_) => true,
                };
                expect(rejected).to_equal(should_error)
            }
        });
    }

    let cases = [
        ("sets rate with shouldCorrectPitch = true", 1.5, false, true),
        ("sets rate with shouldCorrectPitch = false", 0.75, false, false),
        ("rejects too high rate", 40.0, true, false),
        ("rejects negative rate", -10.0, true, false),
    ];
    for (name, rate, should_error, should_correct_pitch) in cases {
        let case = case.clone();
        suite.it(name, move || {
            let case = case.clone();
            async move {
                case.set(RateCase {
                    rate,
                    should_error,
                    should_correct_pitch,
                })
                .await;
                Ok(())
            }
        });
    }
}
