//! Filesystem suite: downloads, read/write, move/copy, directories, sandboxing

use std::sync::Arc;

use super::SuiteContext;
use crate::capabilities::filesystem::{
    DeleteOptions, DownloadOptions, FileSystem, InfoOptions, MakeDirectoryOptions, ReadOptions,
    RelocateOptions, WriteOptions,
};
use crate::harness::{expect, expect_err, SuiteBuilder, TestResult};

const ESCAPED: &str = "../hello/world";

async fn assert_exists(fs: &dyn FileSystem, path: &str, expected: bool) -> TestResult {
    let info = fs.get_info(path, InfoOptions::default()).await?;
    if expected {
        expect(info.exists).to_be_truthy()
    } else {
        expect(info.exists).not().to_be_truthy()
    }
}

async fn delete_quietly(fs: &dyn FileSystem, path: &str) -> TestResult {
    fs.delete(path, DeleteOptions { idempotent: true }).await?;
    Ok(())
}

async fn check_contents(fs: &dyn FileSystem, path: &str, contents: &str) -> TestResult {
    expect(fs.read_as_string(path, ReadOptions::default()).await?).to_be(contents)
}

pub fn register(root: &mut SuiteBuilder, context: &SuiteContext) {
    let fs = context.fs.clone();
    let fixtures = context.fixtures.clone();
    let download_timeout = fixtures.download_timeout();

    root.describe("FileSystem", |suite| {
        {
            let fs = fs.clone();
            let fixtures = fixtures.clone();
            suite.it_with_timeout(
                "delete(idempotent) -> !exists -> download(md5, uri) -> exists -> delete -> !exists",
                download_timeout,
                move || {
                    let fs = fs.clone();
                    let fixtures = fixtures.clone();
                    async move {
                        let filename = "download1.png";
                        delete_quietly(&*fs, filename).await?;
                        assert_exists(&*fs, filename, false).await?;

                        let result = fs
                            .download(&fixtures.image_url, filename, DownloadOptions { md5: true })
                            .await?;
                        expect(result.md5).to_be(Some(fixtures.image_md5.clone()))?;
                        expect(result.uri.ends_with(filename)).to_be(true)?;
                        assert_exists(&*fs, filename, true).await?;

                        fs.delete(filename, DeleteOptions::default()).await?;
                        assert_exists(&*fs, filename, false).await
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it("delete(idempotent) -> delete[error]", move || {
                let fs = fs.clone();
                async move {
                    let filename = "willDelete.png";
                    delete_quietly(&*fs, filename).await?;

                    let error =
                        expect_err(fs.delete(filename, DeleteOptions::default()).await)?;
                    expect(error.to_string()).to_match("not.*found")
                }
            });
        }

        {
            let fs = fs.clone();
            let fixtures = fixtures.clone();
            suite.it_with_timeout(
                "download(md5, uri) -> read -> delete -> !exists -> read[error]",
                download_timeout,
                move || {
                    let fs = fs.clone();
                    let fixtures = fixtures.clone();
                    async move {
                        let filename = "download1.txt";
                        let result = fs
                            .download(&fixtures.text_url, filename, DownloadOptions { md5: true })
                            .await?;
                        expect(result.md5).to_be(Some(fixtures.text_md5.clone()))?;

                        check_contents(&*fs, filename, &fixtures.text_contents).await?;

                        delete_quietly(&*fs, filename).await?;
                        expect_err(fs.read_as_string(filename, ReadOptions::default()).await)?;
                        Ok(())
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it(
                "delete(idempotent) -> !exists -> write -> read -> write -> read",
                move || {
                    let fs = fs.clone();
                    async move {
                        let filename = "write1.txt";
                        delete_quietly(&*fs, filename).await?;
                        assert_exists(&*fs, filename, false).await?;

                        for expected in ["hello, world", "hello, world!!!!!!"] {
                            fs.write_as_string(filename, expected, WriteOptions::default())
                                .await?;
                            check_contents(&*fs, filename, expected).await?;
                        }
                        Ok(())
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it(
                "delete(new) -> 2 * [write -> move -> !exists(orig) -> read(new)]",
                move || {
                    let fs = fs.clone();
                    async move {
                        let (from, to) = ("from.txt", "to.txt");
                        delete_quietly(&*fs, to).await?;

                        // twice, so the second move overwrites
                        for contents in ["contents 1", "contents 2"] {
                            fs.write_as_string(from, contents, WriteOptions::default())
                                .await?;
                            fs.move_entry(RelocateOptions::new(from, to)).await?;
                            assert_exists(&*fs, from, false).await?;
                            check_contents(&*fs, to, contents).await?;
                        }
                        Ok(())
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it(
                "delete(new) -> 2 * [write -> copy -> exists(orig) -> read(new)]",
                move || {
                    let fs = fs.clone();
                    async move {
                        let (from, to) = ("from.txt", "to.txt");
                        delete_quietly(&*fs, to).await?;

                        for contents in ["contents 1", "contents 2"] {
                            fs.write_as_string(from, contents, WriteOptions::default())
                                .await?;
                            fs.copy(RelocateOptions::new(from, to)).await?;
                            assert_exists(&*fs, from, true).await?;
                            check_contents(&*fs, to, contents).await?;
                        }
                        Ok(())
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it(
                "delete(dir) -> write(dir/file)[error] -> mkdir(dir) -> mkdir(dir)[error] -> write(dir/file) -> read",
                move || {
                    let fs = fs.clone();
                    async move {
                        let (path, dir, contents) = ("dir/file", "dir", "hello, world");
                        delete_quietly(&*fs, dir).await?;

                        expect_err(
                            fs.write_as_string(path, contents, WriteOptions::default())
                                .await,
                        )?;
                        fs.make_directory(dir, MakeDirectoryOptions::default())
                            .await?;
                        expect_err(
                            fs.make_directory(dir, MakeDirectoryOptions::default())
                                .await,
                        )?;
                        fs.write_as_string(path, contents, WriteOptions::default())
                            .await?;
                        check_contents(&*fs, path, contents).await
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it(
                "delete(dir) -> write(dir/dir2/file)[error] -> mkdir(dir/dir2, intermediates) -> mkdir(dir/dir2, intermediates) -> write(dir/dir2/file) -> read",
                move || {
                    let fs = fs.clone();
                    async move {
                        let (path, dir, contents) = ("dir/dir2/file", "dir/dir2", "hello, world");
                        let intermediates = MakeDirectoryOptions {
                            intermediates: true,
                        };
                        delete_quietly(&*fs, "dir").await?;

                        expect_err(
                            fs.write_as_string(path, contents, WriteOptions::default())
                                .await,
                        )?;
                        fs.make_directory(dir, intermediates).await?;
                        fs.make_directory(dir, intermediates).await?;
                        expect_err(
                            fs.make_directory(dir, MakeDirectoryOptions::default())
                                .await,
                        )?;
                        fs.write_as_string(path, contents, WriteOptions::default())
                            .await?;
                        check_contents(&*fs, path, contents).await
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            suite.it(
                "delete(dir, idempotent) -> make tree -> check contents -> check directory listings",
                move || {
                    let fs = fs.clone();
                    async move {
                        let intermediates = MakeDirectoryOptions {
                            intermediates: true,
                        };
                        delete_quietly(&*fs, "dir").await?;
                        fs.make_directory("dir/child1", intermediates).await?;
                        fs.make_directory("dir/child2", intermediates).await?;

                        let files = [
                            ("dir/file1", "contents1"),
                            ("dir/file2", "contents2"),
                            ("dir/child1/file3", "contents3"),
                            ("dir/child2/file4", "contents4"),
                            ("dir/child2/file5", "contents5"),
                        ];
                        for (path, contents) in files {
                            fs.write_as_string(path, contents, WriteOptions::default())
                                .await?;
                        }
                        for (path, contents) in files {
                            check_contents(&*fs, path, contents).await?;
                        }

                        expect(fs.read_directory("dir").await?)
                            .to_equal(vec!["child1", "child2", "file1", "file2"])?;
                        expect(fs.read_directory("dir/child1").await?).to_equal(vec!["file3"])?;
                        expect(fs.read_directory("dir/child2").await?)
                            .to_equal(vec!["file4", "file5"])?;

                        expect_err(fs.read_directory("dir/file1").await)?;
                        Ok(())
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            let fixtures = fixtures.clone();
            suite.it_with_timeout(
                "delete(idempotent) -> download(md5) -> getInfo(size)",
                download_timeout,
                move || {
                    let fs = fs.clone();
                    let fixtures = fixtures.clone();
                    async move {
                        let filename = "download1.png";
                        delete_quietly(&*fs, filename).await?;

                        let result = fs
                            .download(&fixtures.image_url, filename, DownloadOptions { md5: true })
                            .await?;
                        expect(result.md5).to_be(Some(fixtures.image_md5.clone()))?;

                        let info = fs.get_info(filename, InfoOptions::default()).await?;
                        expect(info.size).to_be(Some(fixtures.image_size))?;
                        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
                        expect(now - info.modification_time.unwrap_or_default())
                            .to_be_less_than(3600.0)?;

                        fs.delete(filename, DeleteOptions::default()).await?;
                        Ok(())
                    }
                },
            );
        }

        {
            let fs = fs.clone();
            let fixtures = fixtures.clone();
            suite.it("throws out-of-scope exceptions", move || {
                let fs = fs.clone();
                let fixtures = fixtures.clone();
                async move { assert_out_of_scope(fs, &fixtures.escape_url).await }
            });
        }
    });
}

async fn assert_out_of_scope(fs: Arc<dyn FileSystem>, url: &str) -> TestResult {
    expect_err(fs.get_info(ESCAPED, InfoOptions::default()).await)?;
    expect_err(fs.read_as_string(ESCAPED, ReadOptions::default()).await)?;
    expect_err(fs.write_as_string(ESCAPED, "", WriteOptions::default()).await)?;
    expect_err(fs.delete(ESCAPED, DeleteOptions::default()).await)?;
    expect_err(fs.move_entry(RelocateOptions::new("../a/b", "c")).await)?;
    expect_err(fs.move_entry(RelocateOptions::new("c", "../a/b")).await)?;
    expect_err(fs.copy(RelocateOptions::new("../a/b", "c")).await)?;
    expect_err(fs.copy(RelocateOptions::new("c", "../a/b")).await)?;
    expect_err(fs.make_directory(ESCAPED, MakeDirectoryOptions::default()).await)?;
    expect_err(fs.read_directory(ESCAPED).await)?;
    expect_err(fs.download(url, ESCAPED, DownloadOptions::default()).await)?;
    Ok(())
}
