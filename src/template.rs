//! Built-in HTML: the page shell and the upload form.
//!
//! The shell carries the placeholders filled by
//! [`crate::pipeline::assemble::assemble`]: `$title`, `$description`,
//! `$og_image`, `$og_url`, `$nav` and `$content`. It also defines the
//! `copyToClipboard` and `openModal` functions that rendered code blocks and
//! images call.

/// Default page shell.
pub const DEFAULT_SHELL: &str = r##"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta property="og:title" content="$title" />
    <meta property="og:description" content="$description" />
    <meta property="og:image" content="$og_image" />
    <meta property="og:url" content="$og_url" />
    <meta name="twitter:card" content="summary_large_image" />
    <title>$title</title>
    <script>
      tailwind.config = {
        safelist: [
          'text-4xl', 'text-3xl', 'text-2xl', 'font-bold', 'text-gray-800', 'mb-4',
          'text-gray-700', 'bg-blue-600', 'hover:bg-blue-700', 'text-white',
          'py-1', 'px-3', 'rounded', 'copyable', 'image-container',
          'responsive-image', 'blockquote', 'min-w-full', 'table-auto', 'border',
          'list-disc', 'list-decimal', 'list-inside', 'mb-2', 'mt-2', 'p-1',
          'bg-gray-100', 'rounded-lg', 'my-12', 'mx-auto', 'max-w-4xl',
          'text-center', 'text-md', 'text-sm', 'text-gray-600', 'bg-white', 'p-8',
          'shadow', 'mb-12', 'bg-blue-50', 'hover:underline', 'text-blue-600',
          'mt-12', 'cursor-pointer', 'responsive-media', 'video-container',
          'note', 'toc', 'px-4', 'py-2'
        ],
      }
    </script>
    <script src="https://cdn.tailwindcss.com"></script>
    <link href="https://fonts.googleapis.com/css2?family=Noto+Sans+JP:wght@400;700&display=swap" rel="stylesheet">
    <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/5.15.3/css/all.min.css">
    <style>
        body { font-family: 'Noto Sans JP', sans-serif; font-size: 14px; }
        .copyable {
            background: #f3f4f6;
            padding: 10px;
            border-radius: 5px;
            font-family: monospace;
            position: relative;
        }
        .copyable button { position: absolute; right: 10px; top: 10px; }
        .note, blockquote {
            background: #fff3cd;
            border-left: 4px solid #ffeeba;
            padding: 10px;
            border-radius: 5px;
            margin: 1rem 0;
        }
        .image-container { margin-top: 20px; text-align: center; }
        .responsive-image, .responsive-media { max-width: 100%; height: auto; }
        .share-buttons { display: flex; justify-content: center; margin-top: 20px; }
        .share-button {
            background: #edf2f7;
            color: #1a202c;
            padding: 6px 10px;
            margin: 0 4px;
            border-radius: 9999px;
            cursor: pointer;
            display: flex;
            align-items: center;
            font-size: 0.9rem;
        }
        .share-button i { margin-right: 8px; }
        pre { overflow-x: auto; font-size: 0.9rem; }
        code { font-family: monospace; font-size: 0.9rem; }
        table { border-collapse: collapse; width: 100%; }
        .modal {
            display: none;
            position: fixed;
            z-index: 1000;
            inset: 0;
            background-color: rgba(0,0,0,0.8);
            align-items: center;
            justify-content: center;
        }
        .modal-content { position: relative; margin: auto; max-width: 90%; max-height: 90%; }
        .modal-content img, .modal-content video { width: 100%; height: auto; border-radius: 8px; }
        .close-modal {
            position: absolute;
            top: 20px;
            right: 35px;
            color: #f1f1f1;
            font-size: 40px;
            cursor: pointer;
        }
        @media (max-width: 768px) {
            .max-w-4xl { width: 92%; margin: 0.75rem auto; }
            .p-8 { padding: 1rem; }
            .copyable button { position: static; margin-top: 10px; }
        }
    </style>
</head>
<body class="bg-blue-50">
    <div class="max-w-4xl mx-auto my-12 bg-white p-8 rounded-lg shadow">
        <header class="mb-12 text-center">
            <h1 class="text-4xl font-bold text-gray-800">$title</h1>
            <br>
            <p class="text-md text-gray-600">$description</p>
        </header>

        $nav

        $content

        <div class="share-buttons">
            <div class="share-button" onclick="shareOnTwitter()">
                <i class="fab fa-twitter"></i>
                <span>ツイート</span>
            </div>
            <div class="share-button" onclick="shareOnFacebook()">
                <i class="fab fa-facebook-f"></i>
                <span>シェア</span>
            </div>
            <div class="share-button" onclick="location.href='../index.html'">
                <i class="fas fa-home"></i>
                <span>ホーム</span>
            </div>
        </div>
    </div>

    <div id="mediaModal" class="modal">
        <span class="close-modal" onclick="closeModal()">&times;</span>
        <div class="modal-content">
            <img id="modalImage" src="" alt="" style="display: none;">
            <video id="modalVideo" controls style="display: none;">
                <source id="modalVideoSource" src="" type="video/mp4">
                Your browser does not support the video tag.
            </video>
        </div>
    </div>

    <script>
        function copyToClipboard(button) {
            var code = button.previousElementSibling.innerText;
            navigator.clipboard.writeText(code).then(function () {
                button.textContent = 'コピーしました！';
                setTimeout(function () { button.textContent = 'コピー'; }, 2000);
            });
        }

        function shareOnTwitter() {
            var url = encodeURIComponent(document.location.href);
            var text = encodeURIComponent(document.title);
            window.open("https://twitter.com/intent/tweet?url=" + url + "&text=" + text, '_blank');
        }

        function shareOnFacebook() {
            var url = encodeURIComponent(document.location.href);
            window.open("https://www.facebook.com/sharer/sharer.php?u=" + url, '_blank');
        }

        function openModal(src, type) {
            var modal = document.getElementById('mediaModal');
            var modalImg = document.getElementById('modalImage');
            var modalVid = document.getElementById('modalVideo');
            if (type === 'image') {
                modalImg.src = src;
                modalImg.style.display = 'block';
                modalVid.style.display = 'none';
            } else if (type === 'video') {
                document.getElementById('modalVideoSource').src = src;
                modalVid.load();
                modalVid.style.display = 'block';
                modalImg.style.display = 'none';
            }
            modal.style.display = 'flex';
        }

        function closeModal() {
            document.getElementById('mediaModal').style.display = 'none';
            document.getElementById('modalVideo').pause();
        }

        window.onclick = function (event) {
            if (event.target == document.getElementById('mediaModal')) {
                closeModal();
            }
        }
    </script>
</body>
</html>
"##;

/// Form served by the upload service at `GET /`.
pub const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="ja">
<head>
    <meta charset="UTF-8">
    <title>blogpress</title>
    <style>
      body { font-family: sans-serif; margin: 20px; }
      label { display: block; margin: 10px 0; }
    </style>
</head>
<body>
  <h1>blogpress</h1>
  <form action="/upload" method="post" enctype="multipart/form-data">
    <label>Markdown / MBS ファイルをアップロード: <input type="file" name="md_file" accept=".md,.markdown,.mbs"></label>
    <button type="submit">変換</button>
  </form>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_has_every_placeholder() {
        for placeholder in ["$title", "$description", "$og_image", "$og_url", "$nav", "$content"] {
            assert!(DEFAULT_SHELL.contains(placeholder), "missing {placeholder}");
        }
    }

    #[test]
    fn shell_defines_page_scripts() {
        assert!(DEFAULT_SHELL.contains("function copyToClipboard(button)"));
        assert!(DEFAULT_SHELL.contains("function openModal(src, type)"));
    }

    #[test]
    fn form_posts_the_file_field() {
        assert!(UPLOAD_FORM.contains("action=\"/upload\""));
        assert!(UPLOAD_FORM.contains("name=\"md_file\""));
    }
}
